//! Binary program format for Patchy.
//!
//! A program file is nothing but instructions: each one is exactly two bytes,
//! most significant byte first. There is no header, so the file size alone
//! gives the instruction count.

use crate::cpu::DecodeError;
use serde::{Serialize, Deserialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Bytes per instruction word.
pub const WORD_BYTES: usize = 2;

/// A loaded program image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// The program instructions.
    pub words: Vec<u16>,
}

impl Program {
    /// Parse a raw byte stream.
    ///
    /// An odd trailing byte is a malformed instruction, not padding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let chunks = bytes.chunks_exact(WORD_BYTES);
        if let [trailing] = chunks.remainder() {
            return Err(DecodeError::TruncatedStream {
                length: bytes.len(),
                trailing: *trailing,
            });
        }

        let words = chunks
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        Ok(Self { words })
    }

    /// Serialize to the on-disk byte layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.words.iter().flat_map(|w| w.to_be_bytes()).collect()
    }

    /// Get the number of instructions.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Size of the program in bytes.
    pub fn byte_len(&self) -> usize {
        self.words.len() * WORD_BYTES
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl From<Vec<u16>> for Program {
    fn from(words: Vec<u16>) -> Self {
        Self { words }
    }
}

/// Load a program file from disk.
///
/// The length limit is enforced when the image is handed to
/// [`Cpu::load_program`](crate::Cpu::load_program).
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Program, ProgramError> {
    let bytes = std::fs::read(path.as_ref())
        .map_err(|e| ProgramError::Io(e.to_string()))?;

    Ok(Program::from_bytes(&bytes)?)
}

/// Save a program file to disk.
pub fn save_program<P: AsRef<Path>>(path: P, program: &Program) -> Result<(), ProgramError> {
    std::fs::write(path.as_ref(), program.to_bytes())
        .map_err(|e| ProgramError::Io(e.to_string()))
}

/// Where `compile` writes its output for `source`.
///
/// The file name is cut at its first `.` and given a `.bin` extension; a name
/// without any `.` just gets `.bin` appended. The directory is kept.
pub fn output_path<P: AsRef<Path>>(source: P) -> PathBuf {
    let source = source.as_ref();
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stem = match name.find('.') {
        Some(idx) => &name[..idx],
        None => name.as_str(),
    };

    source.with_file_name(format!("{}.bin", stem))
}

/// Errors that can occur while reading or writing program files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("{0}")]
    Malformed(#[from] DecodeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_big_endian() {
        let program = Program::from_bytes(&[0x2A, 0x80, 0x46, 0x0A]).unwrap();
        assert_eq!(program.words, vec![0x2A80, 0x460A]);
        assert_eq!(program.len(), 2);
        assert_eq!(program.byte_len(), 4);
    }

    #[test]
    fn test_odd_trailing_byte_rejected() {
        let err = Program::from_bytes(&[0x00, 0x00, 0x46]).unwrap_err();
        assert_eq!(err, DecodeError::TruncatedStream { length: 3, trailing: 0x46 });
    }

    #[test]
    fn test_empty_stream() {
        assert!(Program::from_bytes(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_to_bytes() {
        let program = Program::from(vec![0x1000, 0x460A]);
        assert_eq!(program.to_bytes(), vec![0x10, 0x00, 0x46, 0x0A]);
    }

    #[test]
    fn test_output_path() {
        assert_eq!(output_path("prog.pasm"), PathBuf::from("prog.bin"));
        assert_eq!(output_path("prog"), PathBuf::from("prog.bin"));
        assert_eq!(output_path("prog.test.pasm"), PathBuf::from("prog.bin"));
        assert_eq!(output_path("demos/hello.pasm"), PathBuf::from("demos/hello.bin"));
    }

    #[test]
    fn test_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("patchy-binary-{}.bin", std::process::id()));
        let program = Program::from(vec![0x2A80, 0x0000]);

        save_program(&path, &program).unwrap();
        let loaded = load_program(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, program);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_program("/definitely/not/here.bin").unwrap_err();
        assert!(matches!(err, ProgramError::Io(_)));
    }
}
