use super::node::{FunctionDecl, Stmt};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub items: Vec<Stmt>,
}

impl Program {
    pub fn new(items: Vec<Stmt>) -> Self {
        Self { items }
    }

    /// Split into function declarations and top-level statements, both in
    /// source order.
    pub fn partition(&self) -> (Vec<&FunctionDecl>, Vec<&Stmt>) {
        let mut functions = Vec::new();
        let mut main = Vec::new();

        for item in &self.items {
            match item {
                Stmt::Function(decl) => functions.push(decl),
                other => main.push(other),
            }
        }

        (functions, main)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}
