//! Instruction decoder for Patchy.
//!
//! Every instruction is one 16-bit word, stored big-endian: byte 1 carries the
//! opcode in its top four bits plus the leading operand bits, byte 2 carries
//! the rest of the operands or an 8-bit immediate.
//!
//! ```text
//!         byte 1      byte 2
//! hlt     0000 0000   0000 0000
//! rst     0001 0000   0000 0000
//! mov     0010 SSSD   DD00 0000    dst = D(bit 0 of byte 1) : DD(bits 7-6 of byte 2)
//! ldr     0011 DDD0   0000 0000
//! ldh     0100 DDD0   IIII IIII
//! ldl     0101 DDD0   IIII IIII
//! ```

use crate::cpu::registers::Register;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Decoded Patchy instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// Dump the core, then halt.
    Hlt,

    /// Reset: PC := 0
    Rst,

    /// Register copy: dst := src
    Mov { dst: Register, src: Register },

    /// Indirect load: dst := [X]
    Ldr { dst: Register },

    /// Load high byte: dst := (dst & 0x00FF) | imm << 8
    Ldh { dst: Register, imm: u8 },

    /// Load low byte: dst := (dst & 0xFF00) | imm
    Ldl { dst: Register, imm: u8 },
}

impl Instruction {
    /// The opcode this instruction encodes to.
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Hlt => Opcode::Hlt,
            Instruction::Rst => Opcode::Rst,
            Instruction::Mov { .. } => Opcode::Mov,
            Instruction::Ldr { .. } => Opcode::Ldr,
            Instruction::Ldh { .. } => Opcode::Ldh,
            Instruction::Ldl { .. } => Opcode::Ldl,
        }
    }
}

/// The 4-bit opcode field.
///
/// All sixteen values have a variant, so decoding a nibble can never fall
/// through; the reserved ones are rejected explicitly in [`decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Hlt,
    Rst,
    Mov,
    Ldr,
    Ldh,
    Ldl,
    Reserved6,
    Reserved7,
    Reserved8,
    Reserved9,
    ReservedA,
    ReservedB,
    ReservedC,
    ReservedD,
    ReservedE,
    ReservedF,
}

impl Opcode {
    /// Opcodes indexed by their numeric value.
    pub const ALL: [Opcode; 16] = [
        Opcode::Hlt,
        Opcode::Rst,
        Opcode::Mov,
        Opcode::Ldr,
        Opcode::Ldh,
        Opcode::Ldl,
        Opcode::Reserved6,
        Opcode::Reserved7,
        Opcode::Reserved8,
        Opcode::Reserved9,
        Opcode::ReservedA,
        Opcode::ReservedB,
        Opcode::ReservedC,
        Opcode::ReservedD,
        Opcode::ReservedE,
        Opcode::ReservedF,
    ];

    /// Extract the opcode from the top nibble of an instruction word.
    pub fn from_word(word: u16) -> Self {
        Self::ALL[(word >> 12) as usize]
    }

    /// Numeric value (0x0-0xF).
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Assembler mnemonic, or `None` for reserved opcodes.
    pub fn mnemonic(self) -> Option<&'static str> {
        match self {
            Opcode::Hlt => Some("hlt"),
            Opcode::Rst => Some("rst"),
            Opcode::Mov => Some("mov"),
            Opcode::Ldr => Some("ldr"),
            Opcode::Ldh => Some("ldh"),
            Opcode::Ldl => Some("ldl"),
            _ => None,
        }
    }
}

/// Bits 1-3 of byte 1: the leading register operand.
fn reg_field(word: u16) -> Register {
    Register::from_bits((word >> 9) as u8)
}

/// Byte 2 as an immediate.
fn imm_field(word: u16) -> u8 {
    (word & 0x00FF) as u8
}

/// Decode a 16-bit instruction word.
pub fn decode(word: u16) -> Result<Instruction, DecodeError> {
    let instruction = match Opcode::from_word(word) {
        Opcode::Hlt => Instruction::Hlt,
        Opcode::Rst => Instruction::Rst,
        Opcode::Mov => {
            // SSSD DD--: the destination straddles the byte boundary
            let src = reg_field(word);
            let dst_high = ((word >> 8) & 0b1) as u8;
            let dst_low = ((word >> 6) & 0b11) as u8;
            Instruction::Mov {
                dst: Register::from_bits(dst_high << 2 | dst_low),
                src,
            }
        }
        Opcode::Ldr => Instruction::Ldr { dst: reg_field(word) },
        Opcode::Ldh => Instruction::Ldh { dst: reg_field(word), imm: imm_field(word) },
        Opcode::Ldl => Instruction::Ldl { dst: reg_field(word), imm: imm_field(word) },
        reserved @ (Opcode::Reserved6
        | Opcode::Reserved7
        | Opcode::Reserved8
        | Opcode::Reserved9
        | Opcode::ReservedA
        | Opcode::ReservedB
        | Opcode::ReservedC
        | Opcode::ReservedD
        | Opcode::ReservedE
        | Opcode::ReservedF) => {
            return Err(DecodeError::ReservedOpcode { opcode: reserved.value(), word });
        }
    };

    Ok(instruction)
}

/// Encode an instruction back to a 16-bit word. Unused operand bits are zero.
pub fn encode(instr: &Instruction) -> u16 {
    let opcode = (instr.opcode().value() as u16) << 12;
    let reg = |r: Register| (r.index() as u16) << 9;

    match *instr {
        Instruction::Hlt | Instruction::Rst => opcode,
        Instruction::Mov { dst, src } => {
            let dst = dst.index() as u16;
            opcode | reg(src) | (dst >> 2) << 8 | (dst & 0b11) << 6
        }
        Instruction::Ldr { dst } => opcode | reg(dst),
        Instruction::Ldh { dst, imm } | Instruction::Ldl { dst, imm } => {
            opcode | reg(dst) | imm as u16
        }
    }
}

/// Errors that can occur during instruction decoding.
///
/// Both variants describe a malformed instruction stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed instruction {word:#06x}: reserved opcode {opcode:#x}")]
    ReservedOpcode { opcode: u8, word: u16 },

    #[error("malformed instruction stream: {length} bytes leaves a trailing byte {trailing:#04x}")]
    TruncatedStream { length: usize, trailing: u8 },
}
