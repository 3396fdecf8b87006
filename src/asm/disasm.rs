//! Disassembler for Patchy programs.
//!
//! Converts binary instruction words back to assembler syntax.

use crate::cpu::decode::{decode, Instruction, Opcode};

/// Disassemble a single instruction word to text.
pub fn disassemble_instruction(word: u16) -> String {
    match decode(word) {
        Ok(decoded) => format_instruction(&decoded),
        Err(_) => format!("??? // {:#06x}", word),
    }
}

/// Disassemble a program listing.
pub fn disassemble(words: &[u16]) -> String {
    let mut output = String::new();
    output.push_str("// Patchy Disassembly\n");
    output.push_str("// -----------------\n\n");

    for (addr, word) in words.iter().enumerate() {
        let line = disassemble_instruction(*word);
        output.push_str(&format!("{:04}: {:<12} // {:04X}\n", addr, line, word));
    }

    output
}

/// Format a decoded instruction as assembler text.
pub fn format_instruction(instr: &Instruction) -> String {
    // Decoded instructions never carry a reserved opcode
    let name = instr.opcode().mnemonic().unwrap_or("???");
    match instr {
        Instruction::Hlt | Instruction::Rst => name.to_string(),
        Instruction::Mov { dst, src } => format!("{} {},{}", name, dst.index(), src.index()),
        Instruction::Ldr { dst } => format!("{} {}", name, dst.index()),
        Instruction::Ldh { dst, imm } | Instruction::Ldl { dst, imm } => {
            format!("{} {},{}", name, dst.index(), imm)
        }
    }
}

/// Render the instruction-set table.
pub fn instruction_set() -> String {
    let mut output = String::new();
    output.push_str("Patchy instruction set (16-bit words, big-endian)\n\n");
    output.push_str("op   mnemonic      layout                  effect\n");

    for op in Opcode::ALL {
        let (operands, layout, effect) = match op {
            Opcode::Hlt => ("", "0000 ---- ---- ----", "dump core, halt"),
            Opcode::Rst => ("", "0001 ---- ---- ----", "PC := 0"),
            Opcode::Mov => (" dst,src", "0010 SSSD DD-- ----", "dst := src"),
            Opcode::Ldr => (" dst", "0011 DDD- ---- ----", "dst := [X]"),
            Opcode::Ldh => (" dst,imm", "0100 DDD- IIII IIII", "dst := dst & 0x00FF | imm << 8"),
            Opcode::Ldl => (" dst,imm", "0101 DDD- IIII IIII", "dst := dst & 0xFF00 | imm"),
            _ => ("", "", "malformed instruction"),
        };
        let syntax = match op.mnemonic() {
            Some(name) => format!("{}{}", name, operands),
            None => "(reserved)".to_string(),
        };
        output.push_str(&format!(
            "0x{:X}  {:<13} {:<23} {}\n",
            op.value(), syntax, layout, effect
        ));
    }

    output.push_str("\nregisters: 0=A 1=B 2=C 3=D 4=E 5=F 6=RET 7=X\n");
    output
}
