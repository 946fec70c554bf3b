//! Fixed-size arrays.
//!
//! An array of length `n` occupies `n` consecutive slots of its frame
//! starting at `base`. Sizes are known at compile time; literal indices are
//! bounds-checked here, computed ones are not checked at all.

use crate::bytecode::{
    compile::Compiler,
    compile_error::CompileError,
    op::{Instruction, Opcode},
    scope::BindingKind,
};
use crate::lang::{
    node::Expr,
    value::{Type, Value},
};

/// Where an array lives, as seen from the current scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ArrayRef {
    pub base: usize,
    pub len: usize,
    pub depth: usize,
}

impl Compiler {
    /// ```text
    /// <v[n-1]> .. <v[0]>            or   push n  push <zero>  dupa
    /// push n  push <base>  push 0  sta
    /// ```
    pub(crate) fn compile_array_decl(
        &mut self,
        name: &str,
        ty: Type,
        size: &Expr,
        elements: &[Expr],
    ) -> Result<(), CompileError> {
        let len = match size {
            Expr::Literal(Value::Int(n)) if *n > 0 => *n as usize,
            _ => return Err(CompileError::NonStaticSize(name.to_string())),
        };

        if elements.is_empty() {
            self.block.emit(Instruction::push_int(len));
            self.block.emit(Instruction::push(ty.zero()));
            self.block.emit_op(Opcode::Dupa);
        } else {
            if elements.len() != len {
                return Err(CompileError::InitializerCount {
                    name: name.to_string(),
                    len,
                    found: elements.len(),
                });
            }
            for element in elements.iter().rev() {
                self.emit_expr(element)?;
            }
        }

        let base = self.scopes.declare_array(name, ty, len);

        self.block.emit(Instruction::push_int(len));
        self.block.emit(Instruction::push_int(base));
        self.block.emit(Instruction::push_int(0));
        self.block.emit_op(Opcode::Sta);
        Ok(())
    }

    /// `<value>` `push 1` `<slot>` `push <depth>` `sta`
    pub(crate) fn compile_array_assign(
        &mut self,
        name: &str,
        index: &Expr,
        value: &Expr,
    ) -> Result<(), CompileError> {
        self.emit_expr(value)?;

        let array = self.array_ref(name)?;
        self.block.emit(Instruction::push_int(1));

        match literal_index(index) {
            Some(i) => {
                let offset = check_bounds(name, i, array.len)?;
                self.block.emit(Instruction::push_int(array.base + offset));
            }
            None => {
                self.emit_expr(index)?;
                self.block.emit(Instruction::push_int(array.base));
                self.block.emit_op(Opcode::Add);
            }
        }

        self.block.emit(Instruction::push_int(array.depth));
        self.block.emit_op(Opcode::Sta);
        Ok(())
    }

    /// Element read. A literal index becomes `push 1` `pusha [base+i:depth]`,
    /// anything else `<index>` `push +[base:depth]`.
    pub(crate) fn compile_index(
        &mut self,
        name: &str,
        index: &Expr,
        ops: &mut Vec<Instruction>,
    ) -> Result<(), CompileError> {
        let array = self.array_ref(name)?;

        match literal_index(index) {
            Some(i) => {
                let offset = check_bounds(name, i, array.len)?;
                ops.push(Instruction::push_int(1));
                ops.push(Instruction::address(
                    Opcode::PushA,
                    array.base + offset,
                    array.depth,
                ));
            }
            None => {
                self.compile_expr(index, ops)?;
                ops.push(Instruction::address(
                    Opcode::PushOffset,
                    array.base,
                    array.depth,
                ));
            }
        }
        Ok(())
    }

    /// `push n` `pusha [base:depth]` `push n` `op`, for printing or
    /// returning a whole array.
    pub(crate) fn emit_whole_array(&mut self, array: ArrayRef, op: Opcode) {
        self.block.emit(Instruction::push_int(array.len));
        self.block
            .emit(Instruction::address(Opcode::PushA, array.base, array.depth));
        self.block.emit(Instruction::push_int(array.len));
        self.block.emit_op(op);
    }

    /// `Some` when `expr` is a bare identifier bound to an array.
    pub(crate) fn array_ident(&self, expr: &Expr) -> Option<ArrayRef> {
        match expr {
            Expr::Ident(name) => self.array_ref(name).ok(),
            _ => None,
        }
    }

    fn array_ref(&self, name: &str) -> Result<ArrayRef, CompileError> {
        let binding = self.scopes.resolve(name)?;
        match &binding.kind {
            BindingKind::Array { base, len, .. } => Ok(ArrayRef {
                base: *base,
                len: *len,
                depth: binding.depth,
            }),
            other => Err(CompileError::not_a(name, "an array", other.describe())),
        }
    }
}

fn literal_index(index: &Expr) -> Option<i64> {
    match index {
        Expr::Literal(Value::Int(i)) => Some(*i),
        _ => None,
    }
}

fn check_bounds(name: &str, index: i64, len: usize) -> Result<usize, CompileError> {
    if index < 0 || index as usize >= len {
        return Err(CompileError::IndexOutOfBounds {
            name: name.to_string(),
            index,
            len,
        });
    }
    Ok(index as usize)
}
