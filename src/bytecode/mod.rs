pub mod array;
pub mod compile;
pub mod compile_error;
pub mod disasm;
pub mod expr;
pub mod flow;
pub mod func;
pub mod ir;
pub mod op;
pub mod patch;
pub mod scope;
pub mod verify;

pub use ir::{CodeBlock, ProgramBc};
