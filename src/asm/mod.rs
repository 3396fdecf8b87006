//! Assembler and disassembler for Patchy programs.
//!
//! This module provides:
//! - A line assembler (text → binary program words)
//! - A disassembler (binary → readable text)
//! - The binary program file format

pub mod assembler;
pub mod binary;
pub mod disasm;

pub use assembler::{assemble, AssemblerError};
pub use binary::{load_program, output_path, save_program, Program, ProgramError};
pub use disasm::{disassemble, disassemble_instruction};
