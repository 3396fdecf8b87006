//! Patchy memory subsystem.
//!
//! A flat 16-bit address space of 65536 sixteen-bit words. The whole array is
//! allocated and zeroed when the processor is built.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of addressable words.
pub const MEMORY_SIZE: usize = 1 << 16;

/// Patchy memory: 65536 sixteen-bit cells.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u16>")]
pub struct Memory {
    cells: Box<[u16]>,
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE].into_boxed_slice(),
        }
    }

    /// Read the word at `address`.
    #[inline]
    pub fn read(&self, address: u32) -> Result<u16, MemoryError> {
        let index = Self::index(address)?;
        Ok(self.cells[index])
    }

    /// Write `value` to `address`.
    ///
    /// Both the address and the value are checked before anything is stored.
    #[inline]
    pub fn write(&mut self, address: u32, value: u32) -> Result<(), MemoryError> {
        let index = Self::index(address)?;
        let word = u16::try_from(value)
            .map_err(|_| MemoryError::ValueOutOfRange { address, value })?;
        self.cells[index] = word;
        Ok(())
    }

    fn index(address: u32) -> Result<usize, MemoryError> {
        let index = address as usize;
        if index >= MEMORY_SIZE {
            return Err(MemoryError::InvalidAddress { address });
        }
        Ok(index)
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Dump a window of memory (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, u16)> {
        let end = start.saturating_add(count).min(self.cells.len());
        (start.min(end)..end)
            .map(|i| (i, self.cells[i]))
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Vec<u16>> for Memory {
    type Error = MemoryError;

    fn try_from(cells: Vec<u16>) -> Result<Self, Self::Error> {
        if cells.len() != MEMORY_SIZE {
            return Err(MemoryError::WrongSize { size: cells.len() });
        }
        Ok(Self { cells: cells.into_boxed_slice() })
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only count non-zero cells
        let non_zero = self.cells.iter().filter(|c| **c != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("invalid memory address {address} (valid: 0-65535)")]
    InvalidAddress { address: u32 },

    #[error("value {value} out of range (0-65535) for memory address {address}")]
    ValueOutOfRange { address: u32, value: u32 },

    #[error("memory image has {size} cells, expected 65536")]
    WrongSize { size: usize },
}
