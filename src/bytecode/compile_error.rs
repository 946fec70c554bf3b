use crate::bytecode::verify::VerifyError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard failures. Any of these aborts compilation; on a well-formed tree
/// none of them can occur.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("compile error: unresolved identifier '{0}'")]
    Unresolved(String),

    /// A name bound to the wrong kind of thing (calling a variable,
    /// indexing a scalar, ...).
    #[error("compile error: '{name}' is {found}, expected {expected}")]
    NotA {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("compile error: function '{name}' takes {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("compile error: function '{0}' already exists")]
    Redeclared(String),

    #[error("compile error: function '{0}' declared inside a block\n  hint: functions must be declared at the top level")]
    NestedFunction(String),

    #[error("compile error: array '{0}' needs an integer literal size")]
    NonStaticSize(String),

    #[error("compile error: index {index} out of bounds for array '{name}' of length {len}")]
    IndexOutOfBounds { name: String, index: i64, len: usize },

    #[error("compile error: array '{name}' has {len} slot(s) but {found} initializer(s)")]
    InitializerCount {
        name: String,
        len: usize,
        found: usize,
    },

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error("compile error: internal error: {0}")]
    Internal(String),
}

impl CompileError {
    pub fn unresolved(name: &str) -> Self {
        CompileError::Unresolved(name.to_string())
    }

    pub fn not_a(name: &str, expected: &'static str, found: &'static str) -> Self {
        CompileError::NotA {
            name: name.to_string(),
            expected,
            found,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        CompileError::Internal(msg.into())
    }
}

/// Soft diagnostic: reported, never fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "warning: {}", self.message)
    }
}
