//! WebAssembly bindings for the Patchy emulator.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.

use wasm_bindgen::prelude::*;
use crate::{Cpu, Program};
use crate::asm::assembler::assemble;
use crate::asm::disasm::{disassemble_instruction, format_instruction};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly CPU wrapper.
#[wasm_bindgen]
pub struct WasmCpu {
    cpu: Cpu,
}

#[wasm_bindgen]
impl WasmCpu {
    /// Create a new CPU instance.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self { cpu: Cpu::new() }
    }

    /// Load a program from assembly source code.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let words = assemble(source)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        self.load_words(&words)
    }

    /// Load a program from the binary file format.
    #[wasm_bindgen]
    pub fn load_binary(&mut self, bytes: &[u8]) -> Result<usize, JsError> {
        let program = Program::from_bytes(bytes)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        self.load_words(&program.words)
    }

    /// Step one instruction. Returns the disassembled instruction.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        let instr = self.cpu.step()
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        Ok(format_instruction(&instr))
    }

    /// Run until halt, exhaustion or max cycles. Returns the tick count.
    #[wasm_bindgen]
    pub fn run(&mut self, max_cycles: u32) -> Result<u64, JsError> {
        self.cpu.run_limited(u64::from(max_cycles))
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        Ok(self.cpu.ticks)
    }

    /// Reset CPU to initial state, keeping the loaded program.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.cpu.reset();
    }

    /// Check if CPU is running.
    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.cpu.is_running()
    }

    /// Check if CPU is halted.
    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.cpu.is_halted()
    }

    /// Get tick count.
    #[wasm_bindgen]
    pub fn ticks(&self) -> u64 {
        self.cpu.ticks
    }

    /// Get program counter.
    #[wasm_bindgen]
    pub fn pc(&self) -> u16 {
        self.cpu.pc
    }

    /// Get a register by index (0-7).
    #[wasm_bindgen]
    pub fn register(&self, index: usize) -> Result<u16, JsError> {
        self.cpu.regs.get(index)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Get a memory word.
    #[wasm_bindgen]
    pub fn memory_at(&self, address: u32) -> Result<u16, JsError> {
        self.cpu.mem.read(address)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Get state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.cpu.state)
    }

    /// Get registers, PC, ticks and ALU flags as a JSON string.
    #[wasm_bindgen]
    pub fn registers_json(&self) -> Result<String, JsError> {
        let registers: serde_json::Map<String, serde_json::Value> = self.cpu.regs
            .iter()
            .map(|(reg, value)| (reg.name().to_string(), value.into()))
            .collect();

        let json = serde_json::json!({
            "registers": registers,
            "pc": self.cpu.pc,
            "ticks": self.cpu.ticks,
            "state": format!("{:?}", self.cpu.state),
            "alu": self.cpu.alu,
        });
        serde_json::to_string(&json).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Render the core dump.
    #[wasm_bindgen]
    pub fn dump(&self) -> String {
        self.cpu.dump()
    }
}

impl WasmCpu {
    fn load_words(&mut self, words: &[u16]) -> Result<usize, JsError> {
        self.cpu = Cpu::new();
        self.cpu.load_program(words)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        Ok(words.len())
    }
}

impl Default for WasmCpu {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble source code and return the binary program bytes.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<Vec<u8>, JsError> {
    let words = assemble(source)
        .map_err(|e| JsError::new(&format!("{}", e)))?;
    Ok(Program::from(words).to_bytes())
}

/// Disassemble a single instruction word.
#[wasm_bindgen]
pub fn wasm_disassemble(word: u16) -> String {
    disassemble_instruction(word)
}
