//! CPU execution engine for Patchy.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.
//! Instructions are fetched from the loaded program image by PC, so `rst`
//! restarts the program from its first word.

use crate::cpu::{Alu, Memory, Registers};
use crate::cpu::decode::{self, Instruction, DecodeError};
use crate::cpu::memory::MemoryError;
use crate::cpu::registers::{Register, RegisterError};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Longest program the PC can walk through: after the last instruction the
/// PC must still fit in 16 bits.
pub const MAX_PROGRAM_LEN: usize = u16::MAX as usize;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU executed the halt instruction.
    Halted,
    /// PC ran past the end of the program.
    Exhausted,
}

/// The Patchy CPU.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// Register file.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// ALU flags (reserved, not driven by any instruction).
    pub alu: Alu,
    /// Program counter: index of the next instruction in the program image.
    pub pc: u16,
    /// Clock pulses, one per executed instruction.
    pub ticks: u64,
    /// Current execution state.
    pub state: CpuState,
    /// Loaded program image.
    program: Vec<u16>,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
}

impl Cpu {
    /// Create a new CPU with zeroed state and no program.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            alu: Alu::new(),
            pc: 0,
            ticks: 0,
            state: CpuState::Exhausted,
            program: Vec::new(),
            last_instr: None,
        }
    }

    /// Reset the CPU to its power-on state, keeping the loaded program.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.alu.reset();
        self.pc = 0;
        self.ticks = 0;
        self.last_instr = None;
        self.state = self.initial_state();
    }

    fn initial_state(&self) -> CpuState {
        if self.program.is_empty() {
            CpuState::Exhausted
        } else {
            CpuState::Running
        }
    }

    /// Load a program image and rewind the PC to its first instruction.
    ///
    /// Registers and memory are left as they are, so callers can preset them.
    pub fn load_program(&mut self, program: &[u16]) -> Result<(), CpuError> {
        if program.len() > MAX_PROGRAM_LEN {
            return Err(CpuError::ProgramTooLarge {
                size: program.len(),
                max: MAX_PROGRAM_LEN,
            });
        }

        self.program = program.to_vec();
        self.pc = 0;
        self.state = self.initial_state();
        Ok(())
    }

    /// The loaded program image.
    pub fn program(&self) -> &[u16] {
        &self.program
    }

    /// Execute a single instruction.
    ///
    /// Returns the instruction that was executed, or an error. An instruction
    /// that fails leaves PC and the tick counter where they were.
    pub fn step(&mut self) -> Result<Instruction, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        // Fetch
        let raw = match self.program.get(self.pc as usize) {
            Some(word) => *word,
            None => {
                self.state = CpuState::Exhausted;
                return Err(CpuError::NotRunning(self.state));
            }
        };

        // Decode
        let instr = decode::decode(raw)?;

        // Execute (advances or rewrites PC)
        self.execute(instr)?;

        // Clock
        self.ticks += 1;
        self.last_instr = Some(instr);

        if instr == Instruction::Hlt {
            self.state = CpuState::Halted;
        } else if self.pc as usize >= self.program.len() {
            self.state = CpuState::Exhausted;
        }

        Ok(instr)
    }

    /// Run until halt, exhaustion or error.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self) -> Result<u64, CpuError> {
        self.run_with(None, |_, _, _| ())
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<u64, CpuError> {
        self.run_with(Some(max_cycles), |_, _, _| ())
    }

    /// Run with an observer that sees every instruction after it commits,
    /// together with the PC it was fetched from.
    ///
    /// The observer is the only place execution may be suspended or inspected:
    /// it runs between instructions, never in the middle of one.
    pub fn run_with<F>(&mut self, max_cycles: Option<u64>, mut on_step: F) -> Result<u64, CpuError>
    where
        F: FnMut(&Cpu, u16, Instruction),
    {
        let start_ticks = self.ticks;

        while self.state == CpuState::Running {
            if let Some(max) = max_cycles {
                if self.ticks - start_ticks >= max {
                    break;
                }
            }

            let pc = self.pc;
            let instr = self.step()?;
            on_step(self, pc, instr);
        }

        Ok(self.ticks - start_ticks)
    }

    /// Execute a decoded instruction.
    fn execute(&mut self, instr: Instruction) -> Result<(), CpuError> {
        match instr {
            Instruction::Hlt => {
                // The dump is rendered by whoever drives the loop
            }

            Instruction::Rst => {
                self.pc = 0;
                return Ok(());
            }

            Instruction::Mov { dst, src } => {
                let value = self.read_reg(src)?;
                self.write_reg(dst, value)?;
            }

            Instruction::Ldr { dst } => {
                let address = self.read_reg(Register::X)?;
                let value = self.mem.read(u32::from(address))?;
                self.write_reg(dst, value)?;
            }

            Instruction::Ldh { dst, imm } => {
                let old = self.read_reg(dst)?;
                self.write_reg(dst, (old & 0x00FF) | (u16::from(imm) << 8))?;
            }

            Instruction::Ldl { dst, imm } => {
                let old = self.read_reg(dst)?;
                self.write_reg(dst, (old & 0xFF00) | u16::from(imm))?;
            }
        }

        match self.pc.checked_add(1) {
            Some(next) => self.pc = next,
            // Only reachable with an image that bypassed `load_program`
            None => self.state = CpuState::Exhausted,
        }
        Ok(())
    }

    fn read_reg(&self, reg: Register) -> Result<u16, CpuError> {
        Ok(self.regs.get(reg.index())?)
    }

    fn write_reg(&mut self, reg: Register, value: u16) -> Result<(), CpuError> {
        Ok(self.regs.set(reg.index(), u32::from(value))?)
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the CPU executed the halt instruction.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("pc", &self.pc)
            .field("ticks", &self.ticks)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("register error: {0}")]
    Register(#[from] RegisterError),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("{0}")]
    MalformedInstruction(#[from] DecodeError),

    #[error("program of {size} instructions exceeds the {max} the PC can address")]
    ProgramTooLarge { size: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::encode;
    use proptest::prelude::*;

    fn make_program(instructions: &[Instruction]) -> Vec<u16> {
        instructions.iter().map(encode).collect()
    }

    fn cpu_with(instructions: &[Instruction]) -> Cpu {
        let mut cpu = Cpu::new();
        cpu.load_program(&make_program(instructions)).unwrap();
        cpu
    }

    #[test]
    fn test_cpu_halt() {
        let mut cpu = cpu_with(&[Instruction::Hlt]);

        let executed = cpu.run().unwrap();

        assert_eq!(executed, 1);
        assert!(cpu.is_halted());
        assert_eq!(cpu.pc, 1);
        assert_eq!(cpu.ticks, 1);
    }

    #[test]
    fn test_halt_stops_before_rest_of_program() {
        let mut cpu = cpu_with(&[
            Instruction::Ldl { dst: Register::A, imm: 1 },
            Instruction::Hlt,
            Instruction::Ldl { dst: Register::A, imm: 2 },
        ]);

        assert_eq!(cpu.run().unwrap(), 2);
        assert_eq!(cpu.regs.get(0).unwrap(), 1);
        assert!(matches!(cpu.step(), Err(CpuError::NotRunning(CpuState::Halted))));
    }

    #[test]
    fn test_mov_scenario() {
        let mut cpu = Cpu::new();
        cpu.regs.set(Register::A.index(), 42).unwrap();
        cpu.load_program(&make_program(&[Instruction::Mov { dst: Register::B, src: Register::A }]))
            .unwrap();

        cpu.run().unwrap();

        assert_eq!(cpu.regs.get(Register::B.index()).unwrap(), 42);
        assert_eq!(cpu.pc, 1);
        assert_eq!(cpu.ticks, 1);
        assert_eq!(cpu.state, CpuState::Exhausted);
    }

    #[test]
    fn test_ldh_scenario() {
        let mut cpu = cpu_with(&[Instruction::Ldh { dst: Register::D, imm: 10 }]);
        cpu.run().unwrap();
        assert_eq!(cpu.regs.get(3).unwrap(), 2560);
    }

    #[test]
    fn test_ldh_then_ldl_builds_word() {
        let mut cpu = cpu_with(&[
            Instruction::Ldh { dst: Register::E, imm: 0xBE },
            Instruction::Ldl { dst: Register::E, imm: 0xEF },
        ]);
        cpu.run().unwrap();
        assert_eq!(cpu.regs.get(4).unwrap(), 0xBEEF);
    }

    #[test]
    fn test_ldr_reads_through_x() {
        let mut cpu = Cpu::new();
        cpu.mem.write(0x1234, 777).unwrap();
        cpu.load_program(&make_program(&[
            Instruction::Ldh { dst: Register::X, imm: 0x12 },
            Instruction::Ldl { dst: Register::X, imm: 0x34 },
            Instruction::Ldr { dst: Register::Ret },
        ]))
        .unwrap();

        cpu.run().unwrap();

        assert_eq!(cpu.regs.get(Register::Ret.index()).unwrap(), 777);
        assert_eq!(cpu.regs.get(Register::X.index()).unwrap(), 0x1234);
    }

    #[test]
    fn test_rst_restarts_program() {
        let mut cpu = cpu_with(&[
            Instruction::Ldl { dst: Register::A, imm: 1 },
            Instruction::Rst,
        ]);

        let executed = cpu.run_limited(5).unwrap();

        assert_eq!(executed, 5);
        assert!(cpu.is_running());
        // ldl, rst, ldl, rst, ldl
        assert_eq!(cpu.pc, 1);
        assert_eq!(cpu.ticks, 5);
    }

    #[test]
    fn test_rst_sets_pc_to_zero() {
        let mut cpu = cpu_with(&[Instruction::Ldl { dst: Register::A, imm: 1 }, Instruction::Rst]);
        cpu.step().unwrap();
        assert_eq!(cpu.pc, 1);
        assert_eq!(cpu.step().unwrap(), Instruction::Rst);
        assert_eq!(cpu.pc, 0);
        assert_eq!(cpu.ticks, 2);
    }

    #[test]
    fn test_reserved_opcode_is_fatal() {
        let mut cpu = Cpu::new();
        cpu.load_program(&[0x6000]).unwrap();

        let err = cpu.run().unwrap_err();

        assert_eq!(
            err,
            CpuError::MalformedInstruction(DecodeError::ReservedOpcode { opcode: 6, word: 0x6000 })
        );
        assert_eq!(cpu.pc, 0);
        assert_eq!(cpu.ticks, 0);
    }

    #[test]
    fn test_empty_program_is_exhausted() {
        let mut cpu = Cpu::new();
        cpu.load_program(&[]).unwrap();
        assert_eq!(cpu.run().unwrap(), 0);
        assert_eq!(cpu.state, CpuState::Exhausted);
    }

    #[test]
    fn test_observer_sees_each_step() {
        let mut cpu = cpu_with(&[
            Instruction::Ldl { dst: Register::A, imm: 3 },
            Instruction::Mov { dst: Register::B, src: Register::A },
            Instruction::Hlt,
        ]);

        let mut seen = Vec::new();
        cpu.run_with(None, |cpu, pc, instr| seen.push((pc, instr, cpu.ticks))).unwrap();

        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].0, 0);
        assert_eq!(seen[2], (2, Instruction::Hlt, 3));
    }

    #[test]
    fn test_reset_keeps_program() {
        let mut cpu = cpu_with(&[Instruction::Ldl { dst: Register::C, imm: 9 }, Instruction::Hlt]);
        cpu.run().unwrap();

        cpu.reset();

        assert_eq!(cpu.pc, 0);
        assert_eq!(cpu.ticks, 0);
        assert_eq!(cpu.regs.get(2).unwrap(), 0);
        assert!(cpu.is_running());
        assert_eq!(cpu.program().len(), 2);
        assert!(cpu.last_instruction().is_none());
    }

    #[test]
    fn test_program_too_large() {
        let mut cpu = Cpu::new();
        let program = vec![0u16; MAX_PROGRAM_LEN + 1];
        assert!(matches!(
            cpu.load_program(&program),
            Err(CpuError::ProgramTooLarge { .. })
        ));
    }

    #[test]
    fn test_pc_overflow_exhausts_instead_of_wrapping() {
        let mut cpu = Cpu::new();
        cpu.program = vec![encode(&Instruction::Ldl { dst: Register::A, imm: 4 }); MAX_PROGRAM_LEN + 1];
        cpu.pc = u16::MAX;
        cpu.state = CpuState::Running;

        cpu.step().unwrap();

        assert_eq!(cpu.regs.get(0).unwrap(), 4);
        assert_eq!(cpu.pc, u16::MAX);
        assert_eq!(cpu.state, CpuState::Exhausted);
    }

    fn preset(values: &[u16; 8]) -> Cpu {
        let mut cpu = Cpu::new();
        for (i, v) in values.iter().enumerate() {
            cpu.regs.set(i, u32::from(*v)).unwrap();
        }
        cpu
    }

    proptest! {
        #[test]
        fn mov_copies_source(values in any::<[u16; 8]>(), dst in 0usize..8, src in 0usize..8) {
            let mut cpu = preset(&values);
            let dst = Register::from_index(dst).unwrap();
            let src = Register::from_index(src).unwrap();
            cpu.load_program(&make_program(&[Instruction::Mov { dst, src }])).unwrap();

            cpu.step().unwrap();

            prop_assert_eq!(cpu.regs.get(dst.index()).unwrap(), values[src.index()]);
            prop_assert_eq!(cpu.regs.get(src.index()).unwrap(), values[src.index()]);
            prop_assert_eq!(cpu.pc, 1);
            prop_assert_eq!(cpu.ticks, 1);
        }

        #[test]
        fn ldh_replaces_high_byte(initial in any::<u16>(), dst in 0usize..8, imm in any::<u8>()) {
            let mut cpu = Cpu::new();
            cpu.regs.set(dst, u32::from(initial)).unwrap();
            let reg = Register::from_index(dst).unwrap();
            cpu.load_program(&make_program(&[Instruction::Ldh { dst: reg, imm }])).unwrap();

            cpu.step().unwrap();

            let result = cpu.regs.get(dst).unwrap();
            prop_assert_eq!((result >> 8) as u8, imm);
            prop_assert_eq!(result & 0x00FF, initial & 0x00FF);
        }

        #[test]
        fn ldl_replaces_low_byte(initial in any::<u16>(), dst in 0usize..8, imm in any::<u8>()) {
            let mut cpu = Cpu::new();
            cpu.regs.set(dst, u32::from(initial)).unwrap();
            let reg = Register::from_index(dst).unwrap();
            cpu.load_program(&make_program(&[Instruction::Ldl { dst: reg, imm }])).unwrap();

            cpu.step().unwrap();

            let result = cpu.regs.get(dst).unwrap();
            prop_assert_eq!(result & 0x00FF, u16::from(imm));
            prop_assert_eq!(result & 0xFF00, initial & 0xFF00);
        }
    }
}
