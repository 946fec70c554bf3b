use tracing::debug;

use crate::bytecode::{
    compile::{Compiler, Redeclaration},
    compile_error::CompileError,
    expr::Lowered,
    op::{Instruction, Opcode},
    scope::{BindingKind, Signature},
};
use crate::lang::node::{Expr, FunctionDecl, Stmt};

impl Compiler {
    /// Bind `decl`'s signature in the top-level scope.
    pub(crate) fn register_function(&mut self, decl: &FunctionDecl) -> Result<(), CompileError> {
        let signature = Signature {
            label: decl.name.to_lowercase(),
            params: decl.params.clone(),
            ret: decl.ret,
        };

        debug!(
            function = %decl.name,
            params = signature.params.len(),
            ret = %signature.ret,
            "registering function"
        );

        if self.scopes.declare_function(&decl.name, signature).is_some() {
            match self.config.redeclaration {
                Redeclaration::Reject => return Err(CompileError::Redeclared(decl.name.clone())),
                Redeclaration::Warn => {
                    self.warn(format!("function '{}' already exists", decl.name))
                }
            }
        }

        Ok(())
    }

    /// ```text
    /// .name
    /// push <params + locals>
    /// alloc
    /// <body>
    /// [ret]
    /// ```
    ///
    /// The caller's `call` opens the frame; `alloc` only grows it to hold
    /// the body's locals.
    pub(crate) fn compile_function(&mut self, decl: &FunctionDecl) -> Result<(), CompileError> {
        self.begin_block(&decl.name);
        self.scopes.open();

        let size = self.block.reserve();
        self.block.emit_op(Opcode::Alloc);

        for param in &decl.params {
            self.scopes
                .declare_scalar(&param.name, param.ty, Lowered::Dynamic);
        }

        self.compile_stmts(&decl.body)?;

        if !matches!(decl.body.last(), Some(Stmt::Return(_))) {
            self.block.emit_op(Opcode::Ret);
        }

        let scope = self.scopes.close()?;
        self.block.patch_count(size, scope.slots())?;

        self.finish_block();
        Ok(())
    }

    /// Arguments in reverse, then `push <argc>` `push .label` `call`.
    pub(crate) fn compile_call(
        &mut self,
        name: &str,
        args: &[Expr],
        ops: &mut Vec<Instruction>,
    ) -> Result<(), CompileError> {
        let signature = match &self.scopes.resolve(name)?.kind {
            BindingKind::Function(signature) => signature.clone(),
            other => return Err(CompileError::not_a(name, "a function", other.describe())),
        };

        if signature.params.len() != args.len() {
            return Err(CompileError::Arity {
                name: name.to_string(),
                expected: signature.params.len(),
                found: args.len(),
            });
        }

        for arg in args.iter().rev() {
            self.compile_expr(arg, ops)?;
        }

        ops.push(Instruction::push_int(args.len()));
        ops.push(Instruction::label(&signature.label));
        ops.push(Instruction::op(Opcode::Call));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::bytecode::ProgramBc;
    use crate::bytecode::compile::{Compiler, CompilerConfig, Redeclaration};
    use crate::bytecode::compile_error::CompileError;
    use crate::lang::node::{BinaryOp, Expr, FunctionDecl, Stmt};
    use crate::lang::program::Program;
    use crate::lang::value::Type;

    fn compile(items: Vec<Stmt>) -> Result<ProgramBc, CompileError> {
        Compiler::with_config(CompilerConfig {
            clear_color: None,
            ..CompilerConfig::default()
        })
        .compile_program(&Program::new(items))
    }

    fn identity(name: &str) -> Stmt {
        Stmt::Function(FunctionDecl::new(
            name,
            &[("a", Type::Int)],
            Type::Int,
            vec![Stmt::Return(Expr::ident("a"))],
        ))
    }

    #[test]
    fn test_function_block_and_call_site() {
        let bc = compile(vec![
            identity("f"),
            Stmt::Print(Expr::call("f", vec![Expr::int(7)])),
        ])
        .unwrap();

        assert_eq!(
            bc.block("f").unwrap().lines(),
            vec!["push 1", "alloc", "push [0:0]", "ret"]
        );
        assert_eq!(
            bc.main().unwrap().lines(),
            vec![
                "push 0", "oframe", "push 7", "push 1", "push .f", "call", "print", "cframe",
                "halt"
            ]
        );
    }

    #[test]
    fn test_arguments_pushed_in_reverse() {
        let bc = compile(vec![
            Stmt::Function(FunctionDecl::new(
                "G",
                &[("x", Type::Int), ("y", Type::Int), ("z", Type::Int)],
                Type::Int,
                vec![Stmt::Return(Expr::ident("x"))],
            )),
            Stmt::let_("b", Type::Int, Expr::int(9)),
            Stmt::Print(Expr::call(
                "G",
                vec![Expr::int(1), Expr::ident("b"), Expr::int(3)],
            )),
        ])
        .unwrap();

        let lines = bc.main().unwrap().lines();
        assert_eq!(
            lines[6..12],
            ["push 3", "push [0:0]", "push 1", "push 3", "push .g", "call"]
        );
    }

    #[test]
    fn test_zero_argument_call_still_pushes_count() {
        let bc = compile(vec![
            Stmt::Function(FunctionDecl::new(
                "seed",
                &[],
                Type::Int,
                vec![Stmt::Return(Expr::int(42))],
            )),
            Stmt::Print(Expr::call("seed", vec![])),
        ])
        .unwrap();

        let lines = bc.main().unwrap().lines();
        assert_eq!(lines[2..5], ["push 0", "push .seed", "call"]);
    }

    #[test]
    fn test_call_before_declaration() {
        let bc = compile(vec![
            Stmt::Function(FunctionDecl::new(
                "first",
                &[],
                Type::Int,
                vec![Stmt::Return(Expr::call("second", vec![]))],
            )),
            Stmt::Function(FunctionDecl::new(
                "second",
                &[],
                Type::Int,
                vec![Stmt::Return(Expr::int(2))],
            )),
        ])
        .unwrap();

        assert_eq!(
            bc.block("first").unwrap().lines(),
            vec!["push 0", "alloc", "push 0", "push .second", "call", "ret"]
        );
    }

    #[test]
    fn test_frame_counts_params_and_locals_with_implicit_ret() {
        let bc = compile(vec![Stmt::Function(FunctionDecl::new(
            "show",
            &[("n", Type::Int)],
            Type::Int,
            vec![
                Stmt::let_("twice", Type::Int, Expr::binary(
                    BinaryOp::Mul,
                    Expr::ident("n"),
                    Expr::int(2),
                )),
                Stmt::Print(Expr::ident("twice")),
            ],
        ))])
        .unwrap();

        assert_eq!(
            bc.block("show").unwrap().lines(),
            vec![
                "push 2",
                "alloc",
                "push 2",
                "push [0:0]",
                "mul",
                "push 1",
                "push 0",
                "st",
                "push [1:0]",
                "print",
                "ret"
            ]
        );
    }

    #[test]
    fn test_early_return_inside_if() {
        let bc = compile(vec![Stmt::Function(FunctionDecl::new(
            "abs",
            &[("n", Type::Int)],
            Type::Int,
            vec![
                Stmt::If {
                    cond: Expr::binary(BinaryOp::Lt, Expr::ident("n"), Expr::int(0)),
                    then: vec![Stmt::Return(Expr::binary(
                        BinaryOp::Sub,
                        Expr::int(0),
                        Expr::ident("n"),
                    ))],
                    otherwise: None,
                },
                Stmt::Return(Expr::ident("n")),
            ],
        ))])
        .unwrap();

        assert_eq!(
            bc.block("abs").unwrap().lines(),
            vec![
                "push 1",
                "alloc",
                "push #PC+13",
                "push 0",
                "oframe",
                "push 0",
                "push [0:1]",
                "lt",
                "push 0",
                "eq",
                "cjmp",
                "push [0:1]",
                "push 0",
                "sub",
                "ret",
                "cframe",
                "push [0:0]",
                "ret"
            ]
        );
    }

    #[test]
    fn test_function_body_cannot_see_main_locals() {
        let result = compile(vec![
            Stmt::let_("g", Type::Int, Expr::int(1)),
            Stmt::Function(FunctionDecl::new(
                "peek",
                &[],
                Type::Int,
                vec![Stmt::Return(Expr::ident("g"))],
            )),
        ]);
        assert_eq!(result.unwrap_err(), CompileError::unresolved("g"));
    }

    #[test]
    fn test_arity_mismatch() {
        let result = compile(vec![
            identity("f"),
            Stmt::Print(Expr::call("f", vec![Expr::int(1), Expr::int(2)])),
        ]);
        assert!(matches!(
            result,
            Err(CompileError::Arity {
                expected: 1,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_calling_a_variable() {
        let result = compile(vec![
            Stmt::let_("v", Type::Int, Expr::int(1)),
            Stmt::Print(Expr::call("v", vec![])),
        ]);
        assert_eq!(
            result.unwrap_err(),
            CompileError::not_a("v", "a function", "a variable")
        );
    }

    #[test]
    fn test_redeclaration_warns_by_default() {
        let bc = compile(vec![identity("f"), identity("F")]).unwrap();

        // names are case-sensitive; labels are not
        assert!(bc.diagnostics.is_empty());
        assert_eq!(bc.blocks.len(), 3);

        let bc = compile(vec![identity("f"), identity("f")]).unwrap();
        assert_eq!(bc.diagnostics.len(), 1);
        assert_eq!(
            bc.diagnostics[0].to_string(),
            "warning: function 'f' already exists"
        );
        assert_eq!(bc.blocks.len(), 3);
    }

    #[test]
    fn test_redeclaration_can_be_rejected() {
        let result = Compiler::with_config(CompilerConfig {
            redeclaration: Redeclaration::Reject,
            ..CompilerConfig::default()
        })
        .compile_program(&Program::new(vec![identity("f"), identity("f")]));

        assert_eq!(result.unwrap_err(), CompileError::Redeclared("f".to_string()));
    }
}
