//! CPU emulation for Patchy.
//!
//! This module implements the complete Patchy architecture:
//! - 65536 sixteen-bit memory words
//! - 8 registers: A, B, C, D, E, F, RET and X (indirect address)
//! - an ALU whose flags are reserved for future compare instructions
//! - 6 fixed-width 16-bit instructions, dispatched by a 4-bit opcode

pub mod alu;
pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;
pub mod dump;

pub use alu::Alu;
pub use memory::{Memory, MemoryError};
pub use registers::{Register, RegisterError, Registers};
pub use decode::{Instruction, Opcode, DecodeError};
pub use execute::{Cpu, CpuError, CpuState};
pub use dump::CoreDump;
