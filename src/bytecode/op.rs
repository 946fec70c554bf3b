use crate::lang::value::Value;
use serde::{Deserialize, Serialize};

// =============================================================================
// OPCODE - PArIR instructions
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Opcode {
    // operand pushes
    Push,
    /// `pusha [i:l]` ( c -- v1 .. vc )
    PushA,
    /// `push +[i:l]` ( o -- v )
    PushOffset,

    // frame stores
    St,
    Sta,

    // arithmetic
    Add,
    Sub,
    Mul,
    Div,

    // comparison
    Lt,
    Le,
    Gt,
    Ge,
    Eq,

    // ==========================================================================
    // Control flow: targets are pushed as `#PC+n` / `#PC-n` literals
    // ==========================================================================
    Jmp,
    Cjmp,
    Call,
    Ret,
    Reta,
    Halt,

    // frames
    OFrame,
    CFrame,
    Alloc,
    Dupa,

    // pad
    Delay,
    Write,
    WriteBox,
    Clear,
    Width,
    Height,
    Irnd,

    // logs
    Print,
    PrintA,
}

impl Opcode {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Push => "push",
            Opcode::PushA => "pusha",
            Opcode::PushOffset => "push +",
            Opcode::St => "st",
            Opcode::Sta => "sta",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Lt => "lt",
            Opcode::Le => "le",
            Opcode::Gt => "gt",
            Opcode::Ge => "ge",
            Opcode::Eq => "eq",
            Opcode::Jmp => "jmp",
            Opcode::Cjmp => "cjmp",
            Opcode::Call => "call",
            Opcode::Ret => "ret",
            Opcode::Reta => "reta",
            Opcode::Halt => "halt",
            Opcode::OFrame => "oframe",
            Opcode::CFrame => "cframe",
            Opcode::Alloc => "alloc",
            Opcode::Dupa => "dupa",
            Opcode::Delay => "delay",
            Opcode::Write => "write",
            Opcode::WriteBox => "write_box",
            Opcode::Clear => "clear",
            Opcode::Width => "width",
            Opcode::Height => "height",
            Opcode::Irnd => "irnd",
            Opcode::Print => "print",
            Opcode::PrintA => "printa",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Value(Value),

    /// Frame-relative address: slot within the frame `depth` hops up the
    /// frame chain.
    Address { slot: usize, depth: usize },

    /// Call target, already lowercased.
    Label(String),

    /// Program-counter-relative jump target, in instruction lines.
    Pc(i64),

    /// Placeholder awaiting a back-patch. Never rendered.
    Reserved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub op: Opcode,
    pub operand: Option<Operand>,
}

impl Instruction {
    pub fn op(op: Opcode) -> Self {
        Self { op, operand: None }
    }

    pub fn push(value: Value) -> Self {
        Self::with(Opcode::Push, Operand::Value(value))
    }

    pub fn push_int(n: usize) -> Self {
        Self::push(Value::Int(n as i64))
    }

    pub fn address(op: Opcode, slot: usize, depth: usize) -> Self {
        Self::with(op, Operand::Address { slot, depth })
    }

    pub fn label(name: &str) -> Self {
        Self::with(Opcode::Push, Operand::Label(name.to_lowercase()))
    }

    #[cfg(test)]
    pub fn pc(offset: i64) -> Self {
        Self::with(Opcode::Push, Operand::Pc(offset))
    }

    pub fn reserved() -> Self {
        Self::with(Opcode::Push, Operand::Reserved)
    }

    fn with(op: Opcode, operand: Operand) -> Self {
        Self {
            op,
            operand: Some(operand),
        }
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self.operand, Some(Operand::Reserved))
    }

    /// Offset of a `push #PC±n`, if this is one.
    pub fn pc_offset(&self) -> Option<i64> {
        match self.operand {
            Some(Operand::Pc(offset)) => Some(offset),
            _ => None,
        }
    }
}

impl std::fmt::Display for Instruction {
    /// One line of PArIR text, without the trailing newline.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mnemonic = self.op.mnemonic();
        match &self.operand {
            None => write!(f, "{}", mnemonic),
            Some(Operand::Value(v)) => write!(f, "{} {}", mnemonic, v),
            Some(Operand::Address { slot, depth }) => {
                // `push +` carries its bracket without a separating space
                if self.op == Opcode::PushOffset {
                    write!(f, "{}[{}:{}]", mnemonic, slot, depth)
                } else {
                    write!(f, "{} [{}:{}]", mnemonic, slot, depth)
                }
            }
            Some(Operand::Label(name)) => write!(f, "{} .{}", mnemonic, name),
            Some(Operand::Pc(offset)) if *offset < 0 => {
                write!(f, "{} #PC-{}", mnemonic, offset.unsigned_abs())
            }
            Some(Operand::Pc(offset)) => write!(f, "{} #PC+{}", mnemonic, offset),
            Some(Operand::Reserved) => write!(f, "{} <reserved>", mnemonic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_forms() {
        assert_eq!(Instruction::op(Opcode::Halt).to_string(), "halt");
        assert_eq!(Instruction::push(Value::Int(5)).to_string(), "push 5");
        assert_eq!(
            Instruction::address(Opcode::Push, 2, 1).to_string(),
            "push [2:1]"
        );
        assert_eq!(
            Instruction::address(Opcode::PushA, 0, 0).to_string(),
            "pusha [0:0]"
        );
        assert_eq!(
            Instruction::address(Opcode::PushOffset, 3, 2).to_string(),
            "push +[3:2]"
        );
        assert_eq!(Instruction::label("DrawBox").to_string(), "push .drawbox");
        assert_eq!(Instruction::pc(4).to_string(), "push #PC+4");
        assert_eq!(Instruction::pc(-11).to_string(), "push #PC-11");
        assert_eq!(Instruction::op(Opcode::WriteBox).to_string(), "write_box");
    }

    #[test]
    fn test_pc_offset_only_for_jump_pushes() {
        assert_eq!(Instruction::pc(-3).pc_offset(), Some(-3));
        assert_eq!(Instruction::push_int(3).pc_offset(), None);
        assert!(Instruction::reserved().is_reserved());
    }
}
