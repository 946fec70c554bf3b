use tracing::{debug, warn};

use crate::{
    bytecode::{
        CodeBlock, ProgramBc,
        compile_error::{CompileError, Diagnostic},
        expr::Lowered,
        ir::MAIN_LABEL,
        op::{Instruction, Opcode},
        patch::Slot,
        scope::{BindingKind, ScopeStack},
        verify::verify_program,
    },
    lang::{
        node::{Assignment, Expr, Stmt, VarDecl},
        program::Program,
        value::Value,
    },
};

/// What to do when a function name is declared twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Redeclaration {
    /// Record a diagnostic and keep going; the later signature wins.
    #[default]
    Warn,
    /// Fail with [`CompileError::Redeclared`].
    Reject,
}

#[derive(Debug, Clone)]
pub struct CompilerConfig {
    pub redeclaration: Redeclaration,
    /// Colour the `.main` prologue clears the pad with, if any.
    pub clear_color: Option<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            redeclaration: Redeclaration::Warn,
            clear_color: Some("#ffffff".to_string()),
        }
    }
}

pub struct Compiler {
    pub(crate) config: CompilerConfig,

    /// Compile-time frame chain
    pub(crate) scopes: ScopeStack,

    /// Block currently being appended to
    pub(crate) block: CodeBlock,

    /// Output program: finished blocks and diagnostics
    program_bc: ProgramBc,
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_config(CompilerConfig::default())
    }

    pub fn with_config(config: CompilerConfig) -> Self {
        Self {
            config,
            scopes: ScopeStack::new(),
            block: CodeBlock::new(MAIN_LABEL),
            program_bc: ProgramBc::new(),
        }
    }

    /// Compile a whole program: one block per function declaration, in
    /// declaration order, then `.main`.
    pub fn compile_program(mut self, program: &Program) -> Result<ProgramBc, CompileError> {
        let (functions, main) = program.partition();

        // Register every signature first so call sites can see functions
        // declared after them
        for decl in &functions {
            self.register_function(decl)?;
        }

        for decl in functions {
            self.compile_function(decl)?;
        }

        self.compile_main(&main)?;

        verify_program(&self.program_bc)?;
        Ok(self.program_bc)
    }

    fn compile_main(&mut self, stmts: &[&Stmt]) -> Result<(), CompileError> {
        self.begin_block(MAIN_LABEL);

        let frame = self.block.reserve();
        self.block.emit_op(Opcode::OFrame);

        if let Some(color) = self.config.clear_color.clone() {
            self.block.emit(Instruction::push(Value::Color(color)));
            self.block.emit_op(Opcode::Clear);
        }

        for stmt in stmts {
            self.compile_stmt(stmt)?;
        }

        let slots = self.scopes.innermost().slots();
        self.block.patch_count(frame, slots)?;
        self.block.emit_op(Opcode::CFrame);
        self.block.emit_op(Opcode::Halt);

        self.finish_block();
        Ok(())
    }

    // =========================================================================
    // Blocks, frames and diagnostics
    // =========================================================================

    pub(crate) fn begin_block(&mut self, label: &str) {
        self.block = CodeBlock::new(label);
    }

    pub(crate) fn finish_block(&mut self) {
        let block = std::mem::replace(&mut self.block, CodeBlock::new(MAIN_LABEL));
        debug!(label = %block.label, instructions = block.code.len(), "finished block");
        self.program_bc.blocks.push(block);
    }

    /// `push <size>` `oframe`, with the size patched in by [`close_frame`].
    ///
    /// [`close_frame`]: Compiler::close_frame
    pub(crate) fn open_frame(&mut self) -> Slot {
        let size = self.block.reserve();
        self.block.emit_op(Opcode::OFrame);
        self.scopes.open();
        size
    }

    pub(crate) fn close_frame(&mut self, size: Slot) -> Result<(), CompileError> {
        let scope = self.scopes.close()?;
        self.block.patch_count(size, scope.slots())?;
        self.block.emit_op(Opcode::CFrame);
        Ok(())
    }

    pub(crate) fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.program_bc.diagnostics.push(Diagnostic::warning(message));
    }

    // =========================================================================
    // Statements
    // =========================================================================

    pub(crate) fn compile_stmts(&mut self, stmts: &[Stmt]) -> Result<(), CompileError> {
        for stmt in stmts {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::VarDecl(decl) => self.compile_var_decl(decl),

            Stmt::ArrayDecl {
                name,
                ty,
                size,
                elements,
            } => self.compile_array_decl(name, *ty, size, elements),

            Stmt::Assign(assignment) => self.compile_assign(assignment),

            Stmt::ArrayAssign { name, index, value } => {
                self.compile_array_assign(name, index, value)
            }

            Stmt::Print(expr) => {
                if let Some(array) = self.array_ident(expr) {
                    self.emit_whole_array(array, Opcode::PrintA);
                    return Ok(());
                }
                self.emit_expr(expr)?;
                self.block.emit_op(Opcode::Print);
                Ok(())
            }

            Stmt::Delay(expr) => {
                self.emit_expr(expr)?;
                self.block.emit_op(Opcode::Delay);
                Ok(())
            }

            Stmt::Write { x, y, color } => self.compile_raster(&[x, y, color], Opcode::Write),

            Stmt::WriteBox { x, y, w, h, color } => {
                self.compile_raster(&[x, y, w, h, color], Opcode::WriteBox)
            }

            Stmt::If {
                cond,
                then,
                otherwise,
            } => self.compile_if(cond, then, otherwise.as_deref()),

            Stmt::While { cond, body } => self.compile_while(cond, body),

            Stmt::For {
                init,
                cond,
                step,
                body,
            } => self.compile_for(init.as_ref(), cond, step.as_ref(), body),

            Stmt::Return(expr) => {
                if let Some(array) = self.array_ident(expr) {
                    self.emit_whole_array(array, Opcode::Reta);
                    return Ok(());
                }
                self.emit_expr(expr)?;
                self.block.emit_op(Opcode::Ret);
                Ok(())
            }

            Stmt::Block(stmts) => {
                let frame = self.open_frame();
                self.compile_stmts(stmts)?;
                self.close_frame(frame)
            }

            Stmt::Function(decl) => Err(CompileError::NestedFunction(decl.name.clone())),
        }
    }

    /// `<init>` `push <slot>` `push 0` `st`
    pub(crate) fn compile_var_decl(&mut self, decl: &VarDecl) -> Result<(), CompileError> {
        let hint = self.emit_expr(&decl.init)?;
        let slot = self.scopes.declare_scalar(&decl.name, decl.ty, hint);

        self.block.emit(Instruction::push_int(slot));
        self.block.emit(Instruction::push_int(0));
        self.block.emit_op(Opcode::St);
        Ok(())
    }

    /// `<value>` `push <slot>` `push <depth>` `st`
    pub(crate) fn compile_assign(&mut self, assignment: &Assignment) -> Result<(), CompileError> {
        let value = self.emit_expr(&assignment.value)?;

        let binding = self.scopes.resolve_mut(&assignment.name)?;
        let depth = binding.depth;
        let slot = match &mut binding.kind {
            BindingKind::Scalar { slot, hint, .. } => {
                *hint = value;
                *slot
            }
            other => {
                return Err(CompileError::not_a(
                    &assignment.name,
                    "a variable",
                    other.describe(),
                ));
            }
        };

        self.block.emit(Instruction::push_int(slot));
        self.block.emit(Instruction::push_int(depth));
        self.block.emit_op(Opcode::St);
        Ok(())
    }

    /// Arguments left to right, then the opcode.
    fn compile_raster(&mut self, args: &[&Expr], op: Opcode) -> Result<(), CompileError> {
        for arg in args {
            self.emit_expr(arg)?;
        }
        self.block.emit_op(op);
        Ok(())
    }

    /// Compile an expression straight into the current block.
    pub(crate) fn emit_expr(&mut self, expr: &Expr) -> Result<Lowered, CompileError> {
        let mut ops = Vec::new();
        let lowered = self.compile_expr(expr, &mut ops)?;
        self.block.extend(ops);
        Ok(lowered)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}
