//! Debugger application state and logic.

use crate::Cpu;
use crate::asm::disasm::format_instruction;
use crate::asm::disassemble_instruction;
use crate::cpu::memory::MEMORY_SIZE;
use std::collections::HashSet;

/// Debugger application state.
pub struct DebuggerApp {
    /// The CPU being debugged.
    pub cpu: Cpu,
    /// Loaded program, for the disassembly view.
    pub program: Vec<u16>,
    /// Breakpoints (by PC).
    pub breakpoints: HashSet<u16>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset.
    pub mem_scroll: usize,
    /// Last core dump produced by a halt.
    pub last_dump: Option<String>,
    /// Let the first tick of a run leave the breakpoint it starts on.
    resuming: bool,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Vec<u16>) -> Self {
        let mut cpu = Cpu::new();
        let status = match cpu.load_program(&program) {
            Ok(()) => "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            Err(e) => format!("Error: {}", e),
        };

        Self {
            cpu,
            program,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status,
            mem_scroll: 0,
            last_dump: None,
            resuming: false,
        }
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        if !self.cpu.is_running() {
            self.status = format!("CPU stopped: {:?}", self.cpu.state);
            self.running = false;
            return;
        }

        let pc = self.cpu.pc;
        match self.cpu.step() {
            Ok(instr) => {
                if self.cpu.is_halted() {
                    self.last_dump = Some(self.cpu.dump());
                }
                self.status = format!("PC={:04}: {}", pc, format_instruction(&instr));
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }
    }

    /// Run until halt, breakpoint, or error.
    pub fn run(&mut self) {
        self.running = true;
        self.resuming = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if !self.cpu.is_running() {
            self.running = false;
            self.status = format!("{:?} after {} ticks", self.cpu.state, self.cpu.ticks);
            return;
        }

        // Check for breakpoint
        let pc = self.cpu.pc;
        let resuming = std::mem::take(&mut self.resuming);
        if self.breakpoints.contains(&pc) && !resuming {
            self.running = false;
            self.status = format!("Breakpoint at PC={}", pc);
            return;
        }

        self.step();
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.pc;
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={}", pc);
        }
    }

    /// Reset CPU to initial state.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.running = false;
        self.last_dump = None;
        self.status = "Reset. Ready.".into();
    }

    pub fn scroll_memory(&mut self, delta: isize) {
        let max = MEMORY_SIZE - 1;
        self.mem_scroll = self.mem_scroll.saturating_add_signed(delta).min(max);
    }

    /// Get disassembly around current PC.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(u16, String, bool)> {
        let pc = self.cpu.pc as usize;
        let start = pc.saturating_sub(lines / 2);

        self.program
            .iter()
            .enumerate()
            .skip(start)
            .take(lines)
            .map(|(addr, word)| (addr as u16, disassemble_instruction(*word), addr == pc))
            .collect()
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Vec<u16>) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(program);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => app.scroll_memory(-1),
                        KeyCode::Down => app.scroll_memory(1),
                        KeyCode::PageUp => app.scroll_memory(-256),
                        KeyCode::PageDown => app.scroll_memory(256),
                        _ => {}
                    }
                }
            }
        }

        // Tick for continuous running
        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble;

    fn app(source: &str) -> DebuggerApp {
        DebuggerApp::new(assemble(source).unwrap())
    }

    #[test]
    fn test_step_until_halt_records_dump() {
        let mut app = app("ldl 0,7\nhlt");
        app.step();
        assert!(app.status.contains("ldl 0,7"));
        assert!(app.last_dump.is_none());

        app.step();
        assert!(app.cpu.is_halted());
        assert!(app.last_dump.as_deref().unwrap_or("").contains("A: 0b0000000000000111 7"));

        app.step();
        assert!(app.status.contains("Halted"));
    }

    #[test]
    fn test_breakpoint_pauses_run() {
        let mut app = app("ldl 0,1\nldl 1,2\nldl 2,3\nhlt");
        app.step();
        app.toggle_breakpoint();
        assert!(app.breakpoints.contains(&1));
        app.toggle_breakpoint();
        assert!(app.breakpoints.is_empty());

        app.reset();
        app.breakpoints.insert(2);
        app.run();
        for _ in 0..10 {
            app.tick();
        }

        assert!(!app.running);
        assert_eq!(app.cpu.pc, 2);
        assert!(app.status.contains("Breakpoint"));

        // Resuming leaves the breakpoint behind
        app.run();
        for _ in 0..10 {
            app.tick();
        }
        assert!(app.cpu.is_halted());
    }

    #[test]
    fn test_disassembly_window_marks_pc() {
        let mut app = app("mov 1,0\nmov 2,0\nhlt");
        app.step();
        app.step();

        let lines = app.get_disassembly(3);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], (1, "mov 2,0".to_string(), false));
        assert_eq!(lines[1], (2, "hlt".to_string(), true));
    }

    #[test]
    fn test_memory_scroll_is_clamped() {
        let mut app = app("hlt");
        app.scroll_memory(-5);
        assert_eq!(app.mem_scroll, 0);
        app.scroll_memory(1 << 20);
        assert_eq!(app.mem_scroll, MEMORY_SIZE - 1);
    }
}
