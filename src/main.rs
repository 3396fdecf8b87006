//! Patchy Emulator - CLI Entry Point
//!
//! Commands:
//! - `patchy compile <source>` - Assemble to `<basename>.bin`
//! - `patchy run <program.bin>` - Run a binary until it halts
//! - `patchy debug <program.bin>` - Interactive stepping debugger
//! - `patchy disasm <program.bin>` - Disassemble a binary
//! - `patchy isa` - Print the instruction set

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "patchy")]
#[command(author = "Yigit")]
#[command(version = "0.1.0")]
#[command(about = "An emulator and assembler for Patchy, a small 16-bit register machine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a source file to a binary program
    Compile {
        /// Path to the source file
        source: PathBuf,
        /// Output file (default: source name up to its first '.', plus .bin)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a program until it halts or runs out of instructions
    Run {
        /// Path to the binary program
        program: PathBuf,
        /// Stop with an error after this many instructions (default: no limit)
        #[arg(short, long)]
        max_cycles: Option<u64>,
        /// Print every executed instruction
        #[arg(short, long)]
        trace: bool,
        /// Write the final machine state to this file as JSON
        #[arg(short, long)]
        state: Option<PathBuf>,
    },
    /// Interactive stepping debugger
    #[cfg(feature = "tui")]
    Debug {
        /// Path to the binary program
        program: PathBuf,
    },
    /// Disassemble a binary program
    Disasm {
        /// Path to the binary program
        program: PathBuf,
    },
    /// Print the instruction set
    Isa,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { source, output } => {
            compile_file(&source, output);
        }
        Commands::Run { program, max_cycles, trace, state } => {
            let options = patchy::RunOptions { max_cycles, trace };
            run_file(&program, options, state.as_deref());
        }
        #[cfg(feature = "tui")]
        Commands::Debug { program } => {
            debug_program(&program);
        }
        Commands::Disasm { program } => {
            disassemble_file(&program);
        }
        Commands::Isa => {
            print!("{}", patchy::asm::disasm::instruction_set());
        }
    }
}

/// Load a binary program or exit with an error.
fn read_program(path: &Path) -> patchy::Program {
    match patchy::load_program(path) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("❌ Failed to load {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn compile_file(source_path: &Path, output: Option<PathBuf>) {
    use patchy::{assemble, save_program, Program};
    use patchy::asm::output_path;

    let out_path = output.unwrap_or_else(|| output_path(source_path));

    println!("📝 Compiling: {} → {}", source_path.display(), out_path.display());

    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to read file: {}", e);
            std::process::exit(1);
        }
    };

    let program = match assemble(&source) {
        Ok(words) => Program::from(words),
        Err(e) => {
            eprintln!("❌ Assembly error: {}", e);
            std::process::exit(1);
        }
    };

    println!("✓ Assembled {} instructions", program.len());

    if let Err(e) = save_program(&out_path, &program) {
        eprintln!("❌ Failed to save program: {}", e);
        std::process::exit(1);
    }

    println!("✓ Saved to {}", out_path.display());
}

fn run_file(path: &Path, options: patchy::RunOptions, state: Option<&Path>) {
    use patchy::{run_program, Cpu};

    println!("Running {}", path.display());
    println!();

    let program = read_program(path);

    let mut cpu = Cpu::new();
    let result = run_program(&mut cpu, &program, options, &mut std::io::stdout().lock());

    if let Some(state_path) = state {
        write_state(&cpu, state_path);
    }

    if let Err(e) = result {
        eprintln!("❌ Run failed at PC={}: {}", cpu.pc, e);
        std::process::exit(1);
    }
}

fn write_state(cpu: &patchy::Cpu, path: &Path) {
    let json = match serde_json::to_string(cpu) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("❌ Failed to serialize state: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = std::fs::write(path, json) {
        eprintln!("❌ Failed to write {}: {}", path.display(), e);
        std::process::exit(1);
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &Path) {
    use patchy::tui::run_debugger;

    println!("🔍 Loading: {}", path.display());

    let program = read_program(path);

    println!("🚀 Launching debugger...");

    if let Err(e) = run_debugger(program.words) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

fn disassemble_file(path: &Path) {
    use patchy::disassemble;

    let program = read_program(path);
    println!("{}", disassemble(&program.words));
}
