//! Core dump rendering.

use crate::cpu::Cpu;
use std::fmt;

/// Format a word as a zero-padded 16-bit binary literal.
pub fn format_word(value: u16) -> String {
    format!("{:#018b}", value)
}

/// Borrowed view of a CPU that renders as a core dump.
pub struct CoreDump<'a>(&'a Cpu);

impl fmt::Display for CoreDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cpu = self.0;

        writeln!(f, "Dumping Patchy Core")?;
        writeln!(f)?;
        writeln!(f, "Registers")?;
        for (reg, value) in cpu.regs.iter() {
            writeln!(f, "{:>3}: {} {}", reg.name(), format_word(value), value)?;
        }
        writeln!(f)?;
        writeln!(f, " PC: {} {}", format_word(cpu.pc), cpu.pc)?;
        writeln!(f, "Ticks: {}", cpu.ticks)?;
        writeln!(f, "State: {:?}", cpu.state)?;
        writeln!(f)?;
        writeln!(f, "ALU")?;
        for (name, set) in cpu.alu.flags() {
            writeln!(f, "{:>13}: {}", name, u8::from(set))?;
        }
        Ok(())
    }
}

impl Cpu {
    /// View of the full architectural state: every register in binary and
    /// decimal, then PC, tick count, execution state and ALU flags.
    pub fn core_dump(&self) -> CoreDump<'_> {
        CoreDump(self)
    }

    /// Render the core dump to a string.
    pub fn dump(&self) -> String {
        self.core_dump().to_string()
    }
}
