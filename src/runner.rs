//! The `run` command: load a program, execute it and report to a writer.

use crate::asm::disasm::format_instruction;
use crate::asm::Program;
use crate::cpu::{Cpu, CpuError, Instruction};
use std::io::{self, Write};
use thiserror::Error;

/// How far and how loudly to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Stop after this many instructions. `None` runs until halt or exhaustion.
    pub max_cycles: Option<u64>,
    /// Print every executed instruction with the register file after it.
    pub trace: bool,
}

/// Run `program` on `cpu`, writing the size line, any trace and the core dump
/// produced by each halt to `out`.
///
/// Returns the number of instructions executed. Stopping on the cycle limit
/// while the program could still run is an error.
pub fn run_program<W: Write>(
    cpu: &mut Cpu,
    program: &Program,
    options: RunOptions,
    out: &mut W,
) -> Result<u64, RunError> {
    writeln!(
        out,
        "Program is {} bytes long, {} Instructions",
        program.byte_len(),
        program.len()
    )?;
    writeln!(out)?;

    cpu.load_program(&program.words)?;

    let mut written = Ok(());
    let executed = cpu.run_with(options.max_cycles, |cpu, pc, instr| {
        if written.is_ok() {
            written = report_step(out, cpu, pc, instr, options.trace);
        }
    })?;
    written?;

    match options.max_cycles {
        Some(limit) if cpu.is_running() => Err(RunError::CycleLimit { limit }),
        _ => Ok(executed),
    }
}

fn report_step<W: Write>(
    out: &mut W,
    cpu: &Cpu,
    pc: u16,
    instr: Instruction,
    trace: bool,
) -> io::Result<()> {
    if trace {
        let regs: Vec<String> = cpu.regs
            .iter()
            .map(|(reg, value)| format!("{}={:04X}", reg.name(), value))
            .collect();
        writeln!(out, "{:04}: {:<10} {}", pc, format_instruction(&instr), regs.join(" "))?;
    }
    if instr == Instruction::Hlt {
        writeln!(out, "{}", cpu.core_dump())?;
    }
    Ok(())
}

/// Errors that end a `run`.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("{0}")]
    Cpu(#[from] CpuError),

    #[error("stopped after {limit} instructions without halting")]
    CycleLimit { limit: u64 },

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}
