use crate::bytecode::compile_error::Diagnostic;
use crate::bytecode::op::{Instruction, Opcode};
use crate::bytecode::verify::{VerifyError, verify_program};
use serde::{Deserialize, Serialize};

/// Label of the block holding top-level code.
pub const MAIN_LABEL: &str = "main";

/// A compiled program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramBc {
    /// One block per function declaration, in declaration order.
    /// Convention: the last block is always `.main`.
    pub blocks: Vec<CodeBlock>,

    /// Soft diagnostics raised while generating.
    pub diagnostics: Vec<Diagnostic>,
}

impl ProgramBc {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn main(&self) -> Option<&CodeBlock> {
        self.blocks.last().filter(|b| b.label == MAIN_LABEL)
    }

    /// First block carrying `label` (compared lowercased).
    #[cfg(test)]
    pub fn block(&self, label: &str) -> Option<&CodeBlock> {
        let label = label.to_lowercase();
        self.blocks.iter().find(|b| b.label == label)
    }

    /// Serialize every block into one PArIR instruction stream.
    ///
    /// Fails if any block would be emitted in a partially patched or
    /// unbalanced state.
    pub fn render(&self) -> Result<String, VerifyError> {
        verify_program(self)?;

        let mut out = String::new();
        for block in &self.blocks {
            block.render_into(&mut out);
        }
        Ok(out)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

impl Default for ProgramBc {
    fn default() -> Self {
        Self::new()
    }
}

/// A single labeled instruction stream. Append-only, except for
/// back-patching of reserved operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub label: String,
    pub code: Vec<Instruction>,
}

impl CodeBlock {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_lowercase(),
            code: Vec::new(),
        }
    }

    /// Index the next instruction will occupy.
    pub fn here(&self) -> usize {
        self.code.len()
    }

    pub fn emit(&mut self, ins: Instruction) {
        self.code.push(ins);
    }

    pub fn emit_op(&mut self, op: Opcode) {
        self.code.push(Instruction::op(op));
    }

    pub fn extend(&mut self, code: Vec<Instruction>) {
        self.code.extend(code);
    }

    #[cfg(test)]
    pub fn count(&self, op: Opcode) -> usize {
        self.code.iter().filter(|ins| ins.op == op).count()
    }

    #[cfg(test)]
    pub fn lines(&self) -> Vec<String> {
        self.code.iter().map(|ins| ins.to_string()).collect()
    }

    fn render_into(&self, out: &mut String) {
        out.push('.');
        out.push_str(&self.label);
        out.push('\n');
        for ins in &self.code {
            out.push_str(&ins.to_string());
            out.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::value::Value;

    #[test]
    fn test_render_headers_and_lines() {
        let mut f = CodeBlock::new("Twice");
        f.emit(Instruction::push_int(1));
        f.emit_op(Opcode::Alloc);
        f.emit(Instruction::address(Opcode::Push, 0, 0));
        f.emit_op(Opcode::Ret);

        let mut main = CodeBlock::new(MAIN_LABEL);
        main.emit(Instruction::push(Value::Int(0)));
        main.emit_op(Opcode::OFrame);
        main.emit_op(Opcode::CFrame);
        main.emit_op(Opcode::Halt);

        let bc = ProgramBc {
            blocks: vec![f, main],
            diagnostics: Vec::new(),
        };

        assert_eq!(
            bc.render().unwrap(),
            ".twice\npush 1\nalloc\npush [0:0]\nret\n.main\npush 0\noframe\ncframe\nhalt\n"
        );
        assert!(bc.main().is_some());
        assert!(bc.block("TWICE").is_some());
    }

    #[test]
    fn test_render_refuses_reserved_slots() {
        let mut main = CodeBlock::new(MAIN_LABEL);
        main.emit(Instruction::reserved());
        main.emit_op(Opcode::Jmp);

        let bc = ProgramBc {
            blocks: vec![main],
            diagnostics: Vec::new(),
        };

        assert!(bc.render().is_err());
    }

    #[test]
    fn test_binary_encoding() {
        let mut main = CodeBlock::new(MAIN_LABEL);
        main.emit(Instruction::label("f"));
        main.emit_op(Opcode::Call);
        let bc = ProgramBc {
            blocks: vec![main],
            diagnostics: Vec::new(),
        };

        let bytes = bc.to_bytes().unwrap();
        let back = ProgramBc::from_bytes(&bytes).unwrap();
        assert_eq!(back.blocks, bc.blocks);
    }
}
