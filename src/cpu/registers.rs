//! Patchy register file.
//!
//! Eight independent 16-bit registers selected by a 3-bit index:
//! - A, B, C, D, E, F: general purpose
//! - RET: return value
//! - X: indirect address register (drives the address bus for `ldr`)

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Number of registers in the file.
pub const REGISTER_COUNT: usize = 8;

/// A register name, as selected by a 3-bit operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Register {
    A,
    B,
    C,
    D,
    E,
    F,
    Ret,
    X,
}

impl Register {
    /// All registers in index order.
    pub const ALL: [Register; REGISTER_COUNT] = [
        Register::A,
        Register::B,
        Register::C,
        Register::D,
        Register::E,
        Register::F,
        Register::Ret,
        Register::X,
    ];

    /// Look up a register by index (0-7).
    pub fn from_index(index: usize) -> Result<Self, RegisterError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(RegisterError::UndefinedRegister { index })
    }

    /// Decode the low three bits of an operand field. Always succeeds.
    pub fn from_bits(bits: u8) -> Self {
        Self::ALL[(bits & 0b111) as usize]
    }

    /// The register's index in the file.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Display name used by the register dump.
    pub fn name(self) -> &'static str {
        match self {
            Register::A => "A",
            Register::B => "B",
            Register::C => "C",
            Register::D => "D",
            Register::E => "E",
            Register::F => "F",
            Register::Ret => "RET",
            Register::X => "X",
        }
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The Patchy register file.
///
/// Opaque: the only way in or out is [`Registers::get`] and [`Registers::set`],
/// both of which validate the index (and `set` the value).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    values: [u16; REGISTER_COUNT],
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self {
            values: [0; REGISTER_COUNT],
        }
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        self.values = [0; REGISTER_COUNT];
    }

    /// Read register `index` (0-7).
    pub fn get(&self, index: usize) -> Result<u16, RegisterError> {
        self.values
            .get(index)
            .copied()
            .ok_or(RegisterError::UndefinedRegister { index })
    }

    /// Write `value` into register `index`.
    ///
    /// The register is left untouched if either argument is out of range.
    pub fn set(&mut self, index: usize, value: u32) -> Result<(), RegisterError> {
        let word = u16::try_from(value)
            .map_err(|_| RegisterError::ValueOutOfRange { index, value })?;
        let slot = self.values
            .get_mut(index)
            .ok_or(RegisterError::UndefinedRegister { index })?;
        *slot = word;
        Ok(())
    }

    /// Iterate over `(register, value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Register, u16)> + '_ {
        Register::ALL.iter().map(move |r| (*r, self.values[r.index()]))
    }
}

impl std::fmt::Debug for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (reg, value) in self.iter() {
            map.entry(&reg.name(), &value);
        }
        map.finish()
    }
}

/// Errors raised by register file access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("undefined register {index} (valid: 0-7)")]
    UndefinedRegister { index: usize },

    #[error("value {value} out of range (0-65535) for register {index}")]
    ValueOutOfRange { index: usize, value: u32 },
}
