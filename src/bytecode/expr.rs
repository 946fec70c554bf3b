//! Expression lowering.
//!
//! Lowering is two-phase. An expression is first lowered into a private
//! buffer and classified; only when the caller commits it does anything
//! reach the output. Literals and pad queries are therefore never emitted
//! and then taken back.

use crate::bytecode::{
    compile::Compiler,
    compile_error::CompileError,
    op::{Instruction, Opcode},
    scope::BindingKind,
};
use crate::lang::{
    node::{BinaryOp, Expr},
    value::Value,
};

/// Zero-argument pad queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Width,
    Height,
}

impl Query {
    pub fn opcode(self) -> Opcode {
        match self {
            Query::Width => Opcode::Width,
            Query::Height => Opcode::Height,
        }
    }
}

/// Result of lowering one expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Lowered {
    /// Known at compile time. Nothing was written to the buffer.
    Static(Value),

    /// A pad query. Nothing was written to the buffer.
    Query(Query),

    /// The buffer holds code that leaves the value on the stack.
    Dynamic,
}

impl Compiler {
    /// Lower `expr` into `ops` and classify it. Static values and queries
    /// leave `ops` untouched; see [`compile_expr`] to also push them.
    ///
    /// [`compile_expr`]: Compiler::compile_expr
    pub(crate) fn lower_expr(
        &mut self,
        expr: &Expr,
        ops: &mut Vec<Instruction>,
    ) -> Result<Lowered, CompileError> {
        match expr {
            Expr::Literal(value) => Ok(Lowered::Static(value.clone())),

            Expr::PadWidth => Ok(Lowered::Query(Query::Width)),
            Expr::PadHeight => Ok(Lowered::Query(Query::Height)),

            Expr::Ident(name) => {
                let binding = self.scopes.resolve(name)?;
                match &binding.kind {
                    BindingKind::Scalar { slot, .. } => {
                        ops.push(Instruction::address(Opcode::Push, *slot, binding.depth));
                        Ok(Lowered::Dynamic)
                    }
                    other => Err(CompileError::not_a(name, "a variable", other.describe())),
                }
            }

            // ( bound -- n )
            Expr::RandomInt(bound) => {
                self.compile_expr(bound, ops)?;
                ops.push(Instruction::op(Opcode::Irnd));
                Ok(Lowered::Dynamic)
            }

            Expr::Binary { op, lhs, rhs } => self.lower_binary(*op, lhs, rhs, ops),

            Expr::Call { name, args } => {
                self.compile_call(name, args, ops)?;
                Ok(Lowered::Dynamic)
            }

            Expr::Index { name, index } => {
                self.compile_index(name, index, ops)?;
                Ok(Lowered::Dynamic)
            }
        }
    }

    /// Lower `expr` and commit it, so its value is on the stack once `ops`
    /// runs.
    pub(crate) fn compile_expr(
        &mut self,
        expr: &Expr,
        ops: &mut Vec<Instruction>,
    ) -> Result<Lowered, CompileError> {
        let mut pending = Vec::new();
        let lowered = self.lower_expr(expr, &mut pending)?;
        commit(&lowered, pending, ops);
        Ok(lowered)
    }

    /// The right operand is pushed first so that the left one ends up on
    /// top of the stack.
    fn lower_binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        ops: &mut Vec<Instruction>,
    ) -> Result<Lowered, CompileError> {
        let mut right_ops = Vec::new();
        let right = self.lower_expr(rhs, &mut right_ops)?;

        let mut left_ops = Vec::new();
        let left = self.lower_expr(lhs, &mut left_ops)?;

        let opcode = match op {
            BinaryOp::Lt => Opcode::Lt,
            BinaryOp::Gt => Opcode::Gt,
            BinaryOp::Le => Opcode::Le,
            BinaryOp::Ge => Opcode::Ge,
            // `!=` shares `eq`; there is no negation opcode
            BinaryOp::Eq | BinaryOp::NotEq => Opcode::Eq,
            BinaryOp::Add => Opcode::Add,
            BinaryOp::Sub => Opcode::Sub,
            BinaryOp::Mul => Opcode::Mul,
            BinaryOp::Div => Opcode::Div,
            BinaryOp::And | BinaryOp::Or => {
                self.warn(format!(
                    "'{}' is not supported by the code generator; the expression emits no code",
                    op.symbol()
                ));
                return Ok(Lowered::Dynamic);
            }
        };

        commit(&right, right_ops, ops);
        commit(&left, left_ops, ops);
        ops.push(Instruction::op(opcode));
        Ok(Lowered::Dynamic)
    }
}

fn commit(lowered: &Lowered, pending: Vec<Instruction>, ops: &mut Vec<Instruction>) {
    match lowered {
        Lowered::Static(value) => ops.push(Instruction::push(value.clone())),
        Lowered::Query(query) => ops.push(Instruction::op(query.opcode())),
        Lowered::Dynamic => ops.extend(pending),
    }
}
