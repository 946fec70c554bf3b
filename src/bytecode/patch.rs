//! Back-patching of jump targets and frame sizes.
//!
//! A construct reserves a `push` before it knows what that push should
//! carry, keeps emitting, and fills the reservation in once the size of the
//! region in between is known. Offsets are measured in instruction lines
//! from the reserved push itself: `target = slot + offset`.

use crate::bytecode::compile_error::CompileError;
use crate::bytecode::ir::CodeBlock;
use crate::bytecode::op::{Instruction, Operand};
use crate::lang::value::Value;

/// Position of a reserved `push` inside its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Slot(usize);

impl Slot {
    #[cfg(test)]
    pub fn index(self) -> usize {
        self.0
    }
}

impl CodeBlock {
    pub fn reserve(&mut self) -> Slot {
        let slot = Slot(self.here());
        self.emit(Instruction::reserved());
        slot
    }

    /// Fill `slot` with `#PC±n` so that it lands on `target`.
    pub fn patch_jump(&mut self, slot: Slot, target: usize) -> Result<i64, CompileError> {
        let offset = target as i64 - slot.0 as i64;
        self.fill(slot, Operand::Pc(offset))?;
        Ok(offset)
    }

    /// Fill `slot` with a frame size.
    pub fn patch_count(&mut self, slot: Slot, n: usize) -> Result<(), CompileError> {
        self.fill(slot, Operand::Value(Value::Int(n as i64)))
    }

    fn fill(&mut self, slot: Slot, operand: Operand) -> Result<(), CompileError> {
        let label = self.label.clone();
        match self.code.get_mut(slot.0) {
            Some(ins) if ins.is_reserved() => {
                ins.operand = Some(operand);
                Ok(())
            }
            _ => Err(CompileError::internal(format!(
                "no reserved operand at {}:{}",
                label, slot.0
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::op::Opcode;

    fn block_with(n: usize) -> CodeBlock {
        let mut block = CodeBlock::new("t");
        for i in 0..n {
            block.emit(Instruction::push_int(i));
        }
        block
    }

    #[test]
    fn test_forward_patch() {
        let mut block = block_with(2);
        let slot = block.reserve();
        block.emit_op(Opcode::Cjmp);
        block.emit_op(Opcode::Print);
        let target = block.here();
        block.emit_op(Opcode::CFrame);

        let offset = block.patch_jump(slot, target).unwrap();

        assert_eq!(offset, 3);
        assert_eq!(block.code[2].to_string(), "push #PC+3");
        assert_eq!(block.code[slot.index() + offset as usize].op, Opcode::CFrame);
    }

    #[test]
    fn test_backward_patch() {
        let mut block = block_with(4);
        let slot = block.reserve();
        block.emit_op(Opcode::Jmp);

        let offset = block.patch_jump(slot, 1).unwrap();

        assert_eq!(offset, -3);
        assert_eq!(block.code[4].to_string(), "push #PC-3");
    }

    #[test]
    fn test_patch_count() {
        let mut block = CodeBlock::new("t");
        let slot = block.reserve();
        block.emit_op(Opcode::OFrame);

        block.patch_count(slot, 2).unwrap();

        assert_eq!(block.lines(), vec!["push 2", "oframe"]);
    }

    #[test]
    fn test_patch_requires_reservation() {
        let mut block = block_with(1);
        assert!(block.patch_jump(Slot(0), 1).is_err());

        let slot = block.reserve();
        block.patch_count(slot, 1).unwrap();
        assert!(block.patch_count(slot, 1).is_err());
    }
}
