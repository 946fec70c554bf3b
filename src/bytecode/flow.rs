//! Conditionals and loops.
//!
//! Every construct opens one frame. Jumps out of a construct land on its
//! `cframe`, so each frame is closed exactly once on every path.
//!
//! ```text
//! if:        S oframe <cond> push 0 eq cjmp <then> X:cframe          S -> X
//! if/else:   S oframe <cond> push 0 eq cjmp <then> J jmp E:<else> X:cframe
//!                                                          S -> E, J -> X
//! while/for: oframe [init] T:<cond> push 0 eq C cjmp <body> [step] B jmp X:cframe
//!                                                          C -> X, B -> T
//! ```

use crate::bytecode::{
    compile::Compiler,
    compile_error::CompileError,
    op::{Instruction, Opcode},
};
use crate::lang::{
    node::{Assignment, Expr, Stmt, VarDecl},
    value::Value,
};

impl Compiler {
    /// `<cond>` `push 0` `eq`, leaving true when `cond` is false.
    fn compile_condition(&mut self, cond: &Expr) -> Result<(), CompileError> {
        self.emit_expr(cond)?;
        self.block.emit(Instruction::push(Value::Int(0)));
        self.block.emit_op(Opcode::Eq);
        Ok(())
    }

    /// Both branches share one frame, sized for the larger of the two.
    pub(crate) fn compile_if(
        &mut self,
        cond: &Expr,
        then: &[Stmt],
        otherwise: Option<&[Stmt]>,
    ) -> Result<(), CompileError> {
        let skip_then = self.block.reserve();
        let frame = self.open_frame();

        self.compile_condition(cond)?;
        self.block.emit_op(Opcode::Cjmp);
        self.compile_stmts(then)?;

        match otherwise {
            None => {
                // land on this construct's cframe, not past it, so the frame
                // is closed on the false path too
                let exit = self.block.here();
                self.block.patch_jump(skip_then, exit)?;
            }
            Some(otherwise) => {
                let skip_else = self.block.reserve();
                self.block.emit_op(Opcode::Jmp);

                let else_start = self.block.here();
                self.block.patch_jump(skip_then, else_start)?;

                self.scopes.rewind();
                self.compile_stmts(otherwise)?;

                let exit = self.block.here();
                self.block.patch_jump(skip_else, exit)?;
            }
        }

        self.close_frame(frame)
    }

    pub(crate) fn compile_while(&mut self, cond: &Expr, body: &[Stmt]) -> Result<(), CompileError> {
        self.compile_loop(None, cond, None, body)
    }

    pub(crate) fn compile_for(
        &mut self,
        init: Option<&VarDecl>,
        cond: &Expr,
        step: Option<&Assignment>,
        body: &[Stmt],
    ) -> Result<(), CompileError> {
        self.compile_loop(init, cond, step, body)
    }

    fn compile_loop(
        &mut self,
        init: Option<&VarDecl>,
        cond: &Expr,
        step: Option<&Assignment>,
        body: &[Stmt],
    ) -> Result<(), CompileError> {
        let frame = self.open_frame();

        if let Some(init) = init {
            self.compile_var_decl(init)?;
        }

        let top = self.block.here();
        self.compile_condition(cond)?;
        let exit = self.block.reserve();
        self.block.emit_op(Opcode::Cjmp);

        self.compile_stmts(body)?;
        if let Some(step) = step {
            self.compile_assign(step)?;
        }

        let back = self.block.reserve();
        self.block.emit_op(Opcode::Jmp);
        self.block.patch_jump(back, top)?;

        let end = self.block.here();
        self.block.patch_jump(exit, end)?;

        self.close_frame(frame)
    }
}
