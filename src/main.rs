mod bytecode;
mod lang;

use std::{env, fs, process};

use crate::bytecode::ProgramBc;
use crate::bytecode::compile::{Compiler, CompilerConfig, Redeclaration};
use crate::bytecode::disasm::{print_bc, print_bc_stats};
use crate::lang::demo::demo_program;
use crate::lang::program::Program;

/// Flags that take a file argument.
const VALUE_FLAGS: [&str; 4] = ["-o", "--emit-bin", "--emit-ast", "--read-bin"];

fn main() {
    let args: Vec<String> = env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        print_usage();
        return;
    }

    // already compiled: list it and stop
    if let Some(path) = flag_value(&args, "--read-bin") {
        let program_bc = load_compiled(path);
        print_bc(&program_bc);
        return;
    }

    let mut config = CompilerConfig::default();
    if has_flag(&args, "--reject-redeclaration") {
        config.redeclaration = Redeclaration::Reject;
    }
    if has_flag(&args, "--no-clear") {
        config.clear_color = None;
    }

    let program = match input_file(&args) {
        Some(filename) => load_program(filename),
        None => {
            println!("demo mode");
            demo_program()
        }
    };

    if let Some(path) = flag_value(&args, "--emit-ast") {
        write_bytes(path, program.to_bytes());
    }

    let program_bc = match Compiler::with_config(config).compile_program(&program) {
        Ok(program_bc) => program_bc,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    for diagnostic in &program_bc.diagnostics {
        eprintln!("{}", diagnostic);
    }

    if has_flag(&args, "--disasm") {
        print_bc(&program_bc);
    }
    if has_flag(&args, "--stats") {
        print_bc_stats(&program_bc);
    }

    if let Some(path) = flag_value(&args, "--emit-bin") {
        write_bytes(path, program_bc.to_bytes());
    }

    emit_text(&program_bc, flag_value(&args, "-o"));
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().skip(1).any(|a| a == flag)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let position = args.iter().position(|a| a == flag)?;
    match args.get(position + 1) {
        Some(value) => Some(value.as_str()),
        None => {
            eprintln!("Error: {} expects a file name", flag);
            process::exit(1);
        }
    }
}

/// First argument that is neither a flag nor a flag's value.
fn input_file(args: &[String]) -> Option<&str> {
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            rest.next();
        } else if !arg.starts_with('-') {
            return Some(arg);
        }
    }
    None
}

fn load_program(filename: &str) -> Program {
    let bytes = match fs::read(filename) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to read '{}': {}", filename, e);
            process::exit(1);
        }
    };

    match Program::from_bytes(&bytes) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("'{}' is not an encoded program: {}", filename, e);
            process::exit(1);
        }
    }
}

fn load_compiled(filename: &str) -> ProgramBc {
    let bytes = match fs::read(filename) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to read '{}': {}", filename, e);
            process::exit(1);
        }
    };

    match ProgramBc::from_bytes(&bytes) {
        Ok(program_bc) => program_bc,
        Err(e) => {
            eprintln!("'{}' is not a compiled program: {}", filename, e);
            process::exit(1);
        }
    }
}

fn write_bytes(path: &str, bytes: Result<Vec<u8>, postcard::Error>) {
    let result = bytes
        .map_err(|e| e.to_string())
        .and_then(|bytes| fs::write(path, bytes).map_err(|e| e.to_string()));

    if let Err(e) = result {
        eprintln!("Failed to write '{}': {}", path, e);
        process::exit(1);
    }
}

fn emit_text(program_bc: &ProgramBc, output: Option<&str>) {
    let text = match program_bc.render() {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = fs::write(path, text) {
                eprintln!("Failed to write '{}': {}", path, e);
                process::exit(1);
            }
        }
        None => print!("{}", text),
    }
}

fn print_usage() {
    println!("PARL - PArL to PArIR code generator");
    println!();
    println!("Usage:");
    println!("  parl                          Compile the built-in demo program");
    println!("  parl <program.bin>            Compile a postcard-encoded program");
    println!("  parl -o <file>                Write PArIR text to <file> instead of stdout");
    println!("  parl --emit-bin <file>        Also write the compiled program (postcard)");
    println!("  parl --emit-ast <file>        Also write the input program (postcard)");
    println!("  parl --read-bin <file>        List a program written by --emit-bin");
    println!("  parl --disasm                 Print an annotated listing");
    println!("  parl --stats                  Print instruction statistics");
    println!("  parl --no-clear               Do not clear the pad on entry");
    println!("  parl --reject-redeclaration   Fail on duplicate function names");
    println!("  parl --help, -h               Show this help");
}
