use crate::bytecode::ProgramBc;
use crate::bytecode::ir::CodeBlock;
use crate::bytecode::op::Opcode;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerifyError {
    #[error("verify error: unpatched operand at {block}:{index}")]
    Unpatched { block: String, index: usize },

    #[error("verify error: cframe without open frame at {block}:{index}")]
    FrameUnderflow { block: String, index: usize },

    #[error("verify error: {open} frame(s) left open at end of .{block}")]
    FrameLeftOpen { block: String, open: usize },

    #[error("verify error: jump at {block}:{index} lands on {target}, outside the block")]
    JumpOutOfBlock {
        block: String,
        index: usize,
        target: i64,
    },
}

/// Check one block.
///
/// NOTE: This is a linear scan. Frame balance is counted in emission order,
/// which matches execution order for every construct the generator emits
/// (each construct closes its frame exactly once, after all of its paths
/// rejoin).
pub fn verify_block(block: &CodeBlock) -> Result<(), VerifyError> {
    let mut open: usize = 0;
    let len = block.code.len() as i64;

    for (index, ins) in block.code.iter().enumerate() {
        if ins.is_reserved() {
            return Err(VerifyError::Unpatched {
                block: block.label.clone(),
                index,
            });
        }

        if let Some(offset) = ins.pc_offset() {
            let target = index as i64 + offset;
            if target < 0 || target >= len {
                return Err(VerifyError::JumpOutOfBlock {
                    block: block.label.clone(),
                    index,
                    target,
                });
            }
        }

        match ins.op {
            Opcode::OFrame => open += 1,
            Opcode::CFrame => {
                open = open.checked_sub(1).ok_or_else(|| VerifyError::FrameUnderflow {
                    block: block.label.clone(),
                    index,
                })?;
            }
            _ => {}
        }
    }

    if open != 0 {
        return Err(VerifyError::FrameLeftOpen {
            block: block.label.clone(),
            open,
        });
    }

    Ok(())
}

pub fn verify_program(bc: &ProgramBc) -> Result<(), VerifyError> {
    for block in &bc.blocks {
        verify_block(block)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::op::Instruction;

    fn block(code: Vec<Instruction>) -> CodeBlock {
        let mut block = CodeBlock::new("t");
        block.extend(code);
        block
    }

    #[test]
    fn test_balanced_frames() {
        let b = block(vec![
            Instruction::push_int(1),
            Instruction::op(Opcode::OFrame),
            Instruction::push_int(0),
            Instruction::op(Opcode::OFrame),
            Instruction::op(Opcode::CFrame),
            Instruction::op(Opcode::CFrame),
        ]);
        assert!(verify_block(&b).is_ok());
    }

    #[test]
    fn test_frame_underflow() {
        let b = block(vec![Instruction::op(Opcode::CFrame)]);
        assert!(matches!(
            verify_block(&b),
            Err(VerifyError::FrameUnderflow { index: 0, .. })
        ));
    }

    #[test]
    fn test_frame_left_open() {
        let b = block(vec![
            Instruction::push_int(1),
            Instruction::op(Opcode::OFrame),
        ]);
        assert!(matches!(
            verify_block(&b),
            Err(VerifyError::FrameLeftOpen { open: 1, .. })
        ));
    }

    #[test]
    fn test_jump_bounds() {
        let inside = block(vec![
            Instruction::pc(2),
            Instruction::op(Opcode::Jmp),
            Instruction::op(Opcode::Halt),
        ]);
        assert!(verify_block(&inside).is_ok());

        let past_end = block(vec![Instruction::pc(2), Instruction::op(Opcode::Jmp)]);
        assert!(verify_block(&past_end).is_err());

        let before_start = block(vec![Instruction::pc(-1), Instruction::op(Opcode::Jmp)]);
        assert!(verify_block(&before_start).is_err());
    }

    #[test]
    fn test_unpatched() {
        let b = block(vec![Instruction::reserved(), Instruction::op(Opcode::Jmp)]);
        assert!(matches!(
            verify_block(&b),
            Err(VerifyError::Unpatched { index: 0, .. })
        ));
    }
}
