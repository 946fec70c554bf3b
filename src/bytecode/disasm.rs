use crate::bytecode::op::{Instruction, Opcode, Operand};
use crate::bytecode::{CodeBlock, ProgramBc};
use std::collections::HashMap;
use std::fmt::Write;

/// Print disassembly of a compiled program
pub fn print_bc(bc: &ProgramBc) {
    println!("=== BYTECODE PROGRAM ===\n");
    print!("{}", disassemble_program(bc));

    for diagnostic in &bc.diagnostics {
        println!("{}", diagnostic);
    }
}

pub fn disassemble_program(bc: &ProgramBc) -> String {
    let mut out = String::new();
    for block in &bc.blocks {
        let _ = writeln!(out, "════════════════════════════════════════");
        let _ = writeln!(out, " .{}", block.label);
        let _ = writeln!(out, " {} instructions", block.code.len());
        let _ = writeln!(out, "════════════════════════════════════════");
        out.push_str(&disassemble_to_string(block));
        out.push('\n');
    }
    out
}

/// Disassemble one block: instruction indices, jump targets marked with ►
/// and resolved jump destinations.
pub fn disassemble_to_string(block: &CodeBlock) -> String {
    let jump_targets = collect_jump_targets(&block.code);
    let mut out = String::new();

    for (ip, ins) in block.code.iter().enumerate() {
        let is_target = jump_targets.contains(&ip);
        if is_target {
            let _ = writeln!(out, "      ┌──────────────────────────────────");
        }

        let marker = if is_target { "► " } else { "  " };
        let _ = writeln!(out, "{:04} {}{}", ip, marker, format_instruction(ins, ip));
    }

    out
}

fn collect_jump_targets(code: &[Instruction]) -> Vec<usize> {
    let mut targets = Vec::new();

    for (ip, ins) in code.iter().enumerate() {
        if let Some(offset) = ins.pc_offset() {
            let target = (ip as i64 + offset) as usize;
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
    }

    targets
}

fn format_instruction(ins: &Instruction, ip: usize) -> String {
    let text = ins.to_string();

    if let Some(Operand::Pc(offset)) = ins.operand {
        let target = ip as i64 + offset;
        let direction = if offset < 0 { "↑" } else { "↓" };
        return format!("{:<16}{} (→ {:04})", text, direction, target);
    }

    match stack_effect(ins.op) {
        Some(effect) => format!("{:<16}; {}", text, effect),
        None => text,
    }
}

fn stack_effect(op: Opcode) -> Option<&'static str> {
    let effect = match op {
        Opcode::St => "( v slot depth -- )",
        Opcode::Sta => "( v.. n slot depth -- )",
        Opcode::PushA => "( n -- v.. )",
        Opcode::PushOffset => "( i -- v )",
        Opcode::Dupa => "( n v -- v.. )",
        Opcode::Cjmp => "( target cond -- )",
        Opcode::Jmp => "( target -- )",
        Opcode::Call => "( args.. argc label -- r )",
        Opcode::OFrame => "( n -- ) F:( -- frame )",
        Opcode::CFrame => "F:( frame -- )",
        Opcode::Alloc => "( n -- )",
        Opcode::Write => "( x y c -- )",
        Opcode::WriteBox => "( x y w h c -- )",
        Opcode::Irnd => "( max -- n )",
        Opcode::PrintA => "( v.. n -- )",
        Opcode::Reta => "( v.. n -- )",
        _ => return None,
    };
    Some(effect)
}

/// Print bytecode statistics
pub fn print_bc_stats(bc: &ProgramBc) {
    println!("=== BYTECODE STATISTICS ===\n");

    let total_ops: usize = bc.blocks.iter().map(|b| b.code.len()).sum();

    println!("Blocks:           {}", bc.blocks.len());
    for block in &bc.blocks {
        println!("  .{:<14} {}", block.label, block.code.len());
    }
    println!("  total:          {}", total_ops);
    println!();

    let mut op_counts: HashMap<&str, usize> = HashMap::new();
    for block in &bc.blocks {
        count_ops(&block.code, &mut op_counts);
    }

    println!("Op frequency:");
    let mut counts: Vec<_> = op_counts.iter().collect();
    counts.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));

    for (op, count) in counts.iter().take(10) {
        let pct = (**count as f64 / total_ops as f64) * 100.0;
        println!("  {:<14} {:>4} ({:>5.1}%)", op, count, pct);
    }
}

fn count_ops<'a>(code: &'a [Instruction], counts: &mut HashMap<&'a str, usize>) {
    for ins in code {
        *counts.entry(ins.op.mnemonic()).or_insert(0) += 1;
    }
}
