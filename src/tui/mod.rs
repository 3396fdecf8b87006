//! TUI debugger for the Patchy emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register file, PC, clock and ALU flags
//! - Memory view (the cell X points at is highlighted)
//! - Step/run/breakpoint controls
//! - Disassembly view
//!
//! Execution only ever pauses between instructions.

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
