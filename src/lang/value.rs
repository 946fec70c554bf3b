use serde::{Deserialize, Serialize};

/// Compile-time literal value in the PArL language.
///
/// Values are what a literal push carries on the operand stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// 64-bit signed integer.
    Int(i64),

    /// 64-bit floating-point number.
    Float(f64),

    /// Boolean value.
    Bool(bool),

    /// Colour literal, kept as written: `#ff00aa`.
    Color(String),
}

impl std::fmt::Display for Value {
    /// Format a value using the instruction-stream surface syntax.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            // Debug keeps the fractional part: 1.0 rather than 1
            Value::Float(n) => write!(f, "{:?}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Color(c) => write!(f, "{}", c),
        }
    }
}

/// Declared type of a variable, parameter, array element or function result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    Int,
    Float,
    Bool,
    Color,
}

impl Type {
    /// Zero value used to fill arrays declared without initializers.
    pub fn zero(self) -> Value {
        match self {
            Type::Int => Value::Int(0),
            Type::Float => Value::Float(0.0),
            Type::Bool => Value::Bool(false),
            Type::Color => Value::Color("#000000".to_string()),
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Type::Int => "int",
            Type::Float => "float",
            Type::Bool => "bool",
            Type::Color => "color",
        };
        write!(f, "{}", name)
    }
}
