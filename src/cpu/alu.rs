//! Patchy ALU state.
//!
//! The ALU is present for architectural completeness only. No instruction
//! drives the input latches or reads the comparator outputs yet, so these
//! flags stay at their power-on values for the whole run. They are the
//! extension point for future compare and branch instructions.

use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alu {
    /// Edge-triggered load of input A.
    pub latch_a: bool,
    /// Edge-triggered load of input B.
    pub latch_b: bool,
    /// A > B
    pub greater: bool,
    /// A < B
    pub less: bool,
    /// A == B
    pub equal: bool,
    /// Drive the result onto the data bus.
    pub output_enable: bool,
}

impl Alu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Flags as `(name, value)` pairs, in display order.
    pub fn flags(&self) -> [(&'static str, bool); 6] {
        [
            ("latch_a", self.latch_a),
            ("latch_b", self.latch_b),
            ("greater", self.greater),
            ("less", self.less),
            ("equal", self.equal),
            ("output_enable", self.output_enable),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alu_powers_on_cleared() {
        let alu = Alu::new();
        assert!(alu.flags().iter().all(|(_, v)| !v));
    }

    #[test]
    fn test_alu_reset() {
        let mut alu = Alu::new();
        alu.greater = true;
        alu.output_enable = true;
        alu.reset();
        assert_eq!(alu, Alu::default());
    }
}
