//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::cpu::dump::format_word;
use crate::cpu::memory::MEMORY_SIZE;
use crate::cpu::Register;
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(60),
            Constraint::Percentage(40),
        ])
        .split(frame.area());

    // Left side: code, registers and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),
            Constraint::Length(15),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: memory and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(4),
        ])
        .split(chunks[1]);

    draw_memory(frame, right_chunks[0], app);
    draw_help(frame, right_chunks[1]);
}

/// Draw disassembly view around the PC.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, instr, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let bp = if app.breakpoints.contains(addr) { "●" } else { " " };
            let text = format!("{}{:04}: {}", prefix, addr, instr);

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(addr) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{} {}", bp, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw the register file, PC, clock and ALU flags.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let cpu = &app.cpu;

    let mut content: Vec<Line> = cpu.regs
        .iter()
        .map(|(reg, value)| {
            let style = if reg == Register::X {
                Style::default().fg(Color::Magenta)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(vec![
                Span::raw(format!("{:>3}: ", reg.name())),
                Span::styled(format_word(value), style),
                Span::raw(format!(" = {:5} ({:#06x})", value, value)),
            ])
        })
        .collect();

    content.push(Line::from(vec![
        Span::raw(" PC: "),
        Span::styled(format!("{}", cpu.pc), Style::default().fg(Color::Yellow)),
        Span::raw("   Ticks: "),
        Span::styled(format!("{}", cpu.ticks), Style::default().fg(Color::Cyan)),
        Span::raw("   State: "),
        Span::styled(format!("{:?}", cpu.state),
            if cpu.is_running() {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Red)
            }),
    ]));

    let flags: Vec<Span> = cpu.alu
        .flags()
        .iter()
        .map(|(name, set)| {
            let style = if *set {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Span::styled(format!("{} ", name), style)
        })
        .collect();
    content.push(Line::from(Span::raw("ALU:")));
    content.push(Line::from(flags));

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw memory view.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);
    let x = app.cpu.regs.get(Register::X.index()).unwrap_or(0) as usize;

    let items: Vec<ListItem> = app.cpu.mem
        .dump(app.mem_scroll, visible_rows.min(MEMORY_SIZE))
        .into_iter()
        .map(|(addr, value)| {
            let text = format!("{:04X}: {:04X} = {}", addr, value, value);

            let style = if addr == x {
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
            } else if value != 0 {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(text).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  r: Run  p: Pause  b: Breakpoint"),
        Line::from("x: Reset  ↑↓/PgUp/PgDn: Scroll memory  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}
