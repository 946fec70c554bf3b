use super::node::{Assignment, BinaryOp, Expr, FunctionDecl, Stmt, VarDecl};
use super::program::Program;
use super::value::Type;

/// Sample program compiled by the driver when run without arguments.
///
/// ```text
/// fun Area(w: int, h: int) -> int { return w * h; }
///
/// let total: int = Area(4, 5);
/// let scale: float = 0.5;
/// let ready: bool = true;
/// total = total * 2;
/// for (let i: int = 0; i < 3; i = i + 1) {
///     __write i, __randi __height, #ff0000;
/// }
/// let row: int[3] = [1, 2, 3];
/// __print row;
/// __print row[1];
/// ```
pub fn demo_program() -> Program {
    let area = FunctionDecl::new(
        "Area",
        &[("w", Type::Int), ("h", Type::Int)],
        Type::Int,
        vec![Stmt::Return(Expr::binary(
            BinaryOp::Mul,
            Expr::ident("w"),
            Expr::ident("h"),
        ))],
    );

    let paint = Stmt::For {
        init: Some(VarDecl::new("i", Type::Int, Expr::int(0))),
        cond: Expr::binary(BinaryOp::Lt, Expr::ident("i"), Expr::int(3)),
        step: Some(Assignment::new(
            "i",
            Expr::binary(BinaryOp::Add, Expr::ident("i"), Expr::int(1)),
        )),
        body: vec![Stmt::Write {
            x: Expr::ident("i"),
            y: Expr::randi(Expr::PadHeight),
            color: Expr::color("#ff0000"),
        }],
    };

    Program::new(vec![
        Stmt::Function(area),
        Stmt::let_(
            "total",
            Type::Int,
            Expr::call("Area", vec![Expr::int(4), Expr::int(5)]),
        ),
        Stmt::let_("scale", Type::Float, Expr::float(0.5)),
        Stmt::let_("ready", Type::Bool, Expr::bool(true)),
        Stmt::assign(
            "total",
            Expr::binary(BinaryOp::Mul, Expr::ident("total"), Expr::int(2)),
        ),
        paint,
        Stmt::ArrayDecl {
            name: "row".to_string(),
            ty: Type::Int,
            size: Expr::int(3),
            elements: vec![Expr::int(1), Expr::int(2), Expr::int(3)],
        },
        Stmt::Print(Expr::ident("row")),
        Stmt::Print(Expr::index("row", Expr::int(1))),
    ])
}
