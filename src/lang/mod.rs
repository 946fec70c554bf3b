//! # PArL language model
//!
//! This module defines the tree the code generator consumes. The lexer,
//! parser and semantic analyser live upstream; by the time a [`Program`]
//! reaches the generator every identifier is declared, every function has a
//! consistent return type, and every literal is well formed.
//!
//! ## Documentation conventions
//!
//! - Stack effects are written as `( before -- after )`.
//! - `[slot:depth]` denotes a frame-relative address.
//!
//! [`Program`]: program::Program

pub mod demo;
pub mod node;
pub mod program;
pub mod value;
