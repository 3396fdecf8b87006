//! Line assembler for Patchy programs.
//!
//! Syntax:
//! ```text
//! // Comment
//! ldh 7,18        // X := 0x12__
//! ldl 7,52        // X := 0x1234
//! ldr 6           // RET := [X]
//! mov 1,6         // B := RET   (destination first)
//! rst             // PC := 0
//! hlt             // dump the core and stop (alias: dump)
//! ```
//!
//! One instruction per line. Operands are decimal and separated by a comma;
//! registers are numbered 0-7 (A, B, C, D, E, F, RET, X).

use crate::cpu::decode::{encode, Instruction};
use crate::cpu::registers::Register;
use thiserror::Error;

/// Assemble source code to a list of instruction words.
pub fn assemble(source: &str) -> Result<Vec<u16>, AssemblerError> {
    let mut output = Vec::new();

    for (line_num, line) in source.lines().enumerate() {
        if let Some(instr) = parse_line(line, line_num + 1)? {
            output.push(encode(&instr));
        }
    }

    Ok(output)
}

/// Parse one source line. Blank and comment lines yield `None`.
pub fn parse_line(line: &str, line_num: usize) -> Result<Option<Instruction>, AssemblerError> {
    // Remove comments, whole-line or trailing
    let line = match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    };
    let line = line.trim();

    if line.is_empty() {
        return Ok(None);
    }

    let (mnemonic, rest) = match line.split_once(char::is_whitespace) {
        Some((m, r)) => (m, r.trim()),
        None => (line, ""),
    };
    let mnemonic = mnemonic.to_lowercase();
    let operands = split_operands(rest);

    let instr = match mnemonic.as_str() {
        "hlt" | "dump" => {
            expect_operands(&mnemonic, &operands, 0, line_num)?;
            Instruction::Hlt
        }
        "rst" => {
            expect_operands(&mnemonic, &operands, 0, line_num)?;
            Instruction::Rst
        }
        "mov" => {
            expect_operands(&mnemonic, &operands, 2, line_num)?;
            Instruction::Mov {
                dst: parse_register(operands[0], line_num)?,
                src: parse_register(operands[1], line_num)?,
            }
        }
        "ldr" => {
            expect_operands(&mnemonic, &operands, 1, line_num)?;
            Instruction::Ldr { dst: parse_register(operands[0], line_num)? }
        }
        "ldh" | "ldl" => {
            expect_operands(&mnemonic, &operands, 2, line_num)?;
            let dst = parse_register(operands[0], line_num)?;
            let imm = parse_immediate(operands[1], line_num)?;
            if mnemonic == "ldh" {
                Instruction::Ldh { dst, imm }
            } else {
                Instruction::Ldl { dst, imm }
            }
        }
        _ => {
            return Err(AssemblerError::UnknownMnemonic {
                line: line_num,
                mnemonic: mnemonic.to_string(),
            })
        }
    };

    Ok(Some(instr))
}

fn split_operands(rest: &str) -> Vec<&str> {
    if rest.is_empty() {
        return Vec::new();
    }
    rest.split(',').map(str::trim).collect()
}

fn expect_operands(mnemonic: &str, operands: &[&str], expected: usize, line_num: usize)
    -> Result<(), AssemblerError>
{
    if operands.len() != expected {
        return Err(AssemblerError::OperandCount {
            line: line_num,
            mnemonic: mnemonic.to_string(),
            expected,
            found: operands.len(),
        });
    }
    Ok(())
}

fn parse_number(operand: &str, line_num: usize) -> Result<u32, AssemblerError> {
    operand.parse::<u32>().map_err(|_| AssemblerError::SyntaxError {
        line: line_num,
        message: format!("expected a decimal number, found '{}'", operand),
    })
}

fn parse_register(operand: &str, line_num: usize) -> Result<Register, AssemblerError> {
    let index = parse_number(operand, line_num)?;
    Register::from_index(index as usize).map_err(|_| AssemblerError::UndefinedRegister {
        line: line_num,
        index,
    })
}

fn parse_immediate(operand: &str, line_num: usize) -> Result<u8, AssemblerError> {
    let value = parse_number(operand, line_num)?;
    u8::try_from(value).map_err(|_| AssemblerError::ValueOutOfRange {
        line: line_num,
        value,
    })
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("line {line}: {mnemonic} takes {expected} operand(s), found {found}")]
    OperandCount { line: usize, mnemonic: String, expected: usize, found: usize },

    #[error("undefined register on line {line}: {index} (valid: 0-7)")]
    UndefinedRegister { line: usize, index: u32 },

    #[error("immediate out of range on line {line}: {value} (valid: 0-255)")]
    ValueOutOfRange { line: usize, value: u32 },
}
