//! # Patchy Emulator
//!
//! An emulator and assembler for Patchy, a small 16-bit register machine.
//!
//! Patchy has eight 16-bit registers, 64K words of memory and six fixed-width
//! instructions. Programs are assembled from a line-oriented text format into
//! a flat binary of big-endian instruction words, which the emulator runs one
//! fetch-decode-execute cycle at a time.

pub mod cpu;
pub mod asm;
pub mod runner;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Alu, Cpu, CpuError, CpuState, Instruction, Memory, Register, Registers};
pub use asm::{assemble, disassemble, load_program, save_program, AssemblerError, Program};
pub use runner::{run_program, RunError, RunOptions};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
