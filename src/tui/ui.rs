//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::machine::MachineState;
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .split(frame.area());

    // Left side: code, registers and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(5),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: memory, I/O and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),
            Constraint::Length(6),
            Constraint::Length(4),
        ])
        .split(chunks[1]);

    draw_memory(frame, right_chunks[0], app);
    draw_io(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

/// Draw disassembly view.
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

/// Draw register state.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let state = app.machine.state();

    let content = vec![
        Line::from(vec![
            Span::raw("PC: "),
            Span::styled(format!("{:<8}", app.machine.regs.pc), Style::default().fg(Color::Yellow)),
            Span::raw("RB: "),
            Span::styled(format!("{}", app.machine.regs.relative_base), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::raw("Steps: "),
            Span::styled(format!("{:<8}", app.machine.steps()), Style::default().fg(Color::Cyan)),
            Span::raw("State: "),
            Span::styled(format!("{:?}", state), state_style(state)),
        ]),
        Line::from(vec![
            Span::raw("Last: "),
            Span::styled(
                app.last_executed(),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
    ];

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
    let pc = app.machine.regs.pc;

    let items: Vec<ListItem> = app
        .memory_rows(visible_rows)
        .into_iter()
        .map(|(start, words)| {
            let mut spans = vec![Span::raw(format!("{:05}:", start))];
            for (i, value) in words.iter().enumerate() {
                let style = if start + i == pc {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else if *value != 0 {
                    Style::default().fg(Color::White)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                spans.push(Span::styled(format!(" {:>6}", value), style));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw queued input and emitted output.
fn draw_io(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let pending: Vec<String> = app.machine.pending_input().map(|v| v.to_string()).collect();
    let outputs = app.machine.outputs();
    let shown = outputs.len().saturating_sub(32);
    let recent: Vec<String> = outputs[shown..].iter().map(|v| v.to_string()).collect();

    let content = vec![
        Line::from(vec![
            Span::raw("In:  "),
            Span::styled(pending.join(","), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::raw(format!("Out ({}): ", outputs.len())),
            Span::styled(recent.join(","), Style::default().fg(Color::Green)),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" I/O ")
            .borders(Borders::ALL));

    frame.render_widget(paragraph, area);
}

/// Draw status bar (or the input prompt while typing).
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let (title, text, color) = if app.input_mode {
        (" Input ", format!("> {}_", app.input_buffer), Color::Cyan)
    } else {
        (" Status ", app.status.clone(), Color::White)
    };

    let status = Paragraph::new(text)
        .style(Style::default().fg(color))
        .block(Block::default()
            .title(title)
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  r: Run  p: Pause  b: Breakpoint  i: Input"),
        Line::from("x: Reset  ↑↓: Scroll memory  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}

/// Get color style for a machine state.
fn state_style(state: MachineState) -> Style {
    match state {
        MachineState::Runnable => Style::default().fg(Color::Green),
        MachineState::AwaitingInput => Style::default().fg(Color::Yellow),
        MachineState::Halted => Style::default().fg(Color::Red),
    }
}
