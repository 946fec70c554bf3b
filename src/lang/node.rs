use super::value::{Type, Value};
use serde::{Deserialize, Serialize};

/// Binary operators, grouped the way the grammar groups them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // relational
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    NotEq,

    // additive
    Add,
    Sub,
    Or,

    // multiplicative
    Mul,
    Div,
    And,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Or => "or",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::And => "and",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Value),

    /// Variable or array read by name.
    Ident(String),

    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    Call {
        name: String,
        args: Vec<Expr>,
    },

    // Pad queries
    PadWidth,
    PadHeight,
    /// `__randi bound` ( -- n )
    RandomInt(Box<Expr>),

    /// Array element read: `name[index]`.
    Index {
        name: String,
        index: Box<Expr>,
    },
}

impl Expr {
    pub fn int(n: i64) -> Self {
        Expr::Literal(Value::Int(n))
    }

    pub fn float(n: f64) -> Self {
        Expr::Literal(Value::Float(n))
    }

    pub fn bool(b: bool) -> Self {
        Expr::Literal(Value::Bool(b))
    }

    pub fn color(c: &str) -> Self {
        Expr::Literal(Value::Color(c.to_string()))
    }

    pub fn ident(name: &str) -> Self {
        Expr::Ident(name.to_string())
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn call(name: &str, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.to_string(),
            args,
        }
    }

    pub fn randi(bound: Expr) -> Self {
        Expr::RandomInt(Box::new(bound))
    }

    pub fn index(name: &str, index: Expr) -> Self {
        Expr::Index {
            name: name.to_string(),
            index: Box::new(index),
        }
    }
}

/// `let name: ty = init;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    pub ty: Type,
    pub init: Expr,
}

impl VarDecl {
    pub fn new(name: &str, ty: Type, init: Expr) -> Self {
        Self {
            name: name.to_string(),
            ty,
            init,
        }
    }
}

/// `name = value;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub name: String,
    pub value: Expr,
}

impl Assignment {
    pub fn new(name: &str, value: Expr) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub ret: Type,
    pub body: Vec<Stmt>,
}

impl FunctionDecl {
    pub fn new(name: &str, params: &[(&str, Type)], ret: Type, body: Vec<Stmt>) -> Self {
        Self {
            name: name.to_string(),
            params: params
                .iter()
                .map(|(name, ty)| Param {
                    name: name.to_string(),
                    ty: *ty,
                })
                .collect(),
            ret,
            body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    VarDecl(VarDecl),

    /// `let name: ty[size] = [elements];` with `elements` empty for a
    /// default-filled array.
    ArrayDecl {
        name: String,
        ty: Type,
        size: Expr,
        elements: Vec<Expr>,
    },

    Assign(Assignment),

    /// `name[index] = value;`
    ArrayAssign {
        name: String,
        index: Expr,
        value: Expr,
    },

    Print(Expr),
    Delay(Expr),

    // Raster writes
    Write {
        x: Expr,
        y: Expr,
        color: Expr,
    },
    WriteBox {
        x: Expr,
        y: Expr,
        w: Expr,
        h: Expr,
        color: Expr,
    },

    // Control flow
    If {
        cond: Expr,
        then: Vec<Stmt>,
        otherwise: Option<Vec<Stmt>>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    For {
        init: Option<VarDecl>,
        cond: Expr,
        step: Option<Assignment>,
        body: Vec<Stmt>,
    },
    Return(Expr),

    /// Nested `{ ... }` block.
    Block(Vec<Stmt>),

    /// Only valid at the top level of a program.
    Function(FunctionDecl),
}

impl Stmt {
    pub fn let_(name: &str, ty: Type, init: Expr) -> Self {
        Stmt::VarDecl(VarDecl::new(name, ty, init))
    }

    pub fn assign(name: &str, value: Expr) -> Self {
        Stmt::Assign(Assignment::new(name, value))
    }
}
