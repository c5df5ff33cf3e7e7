//! Query input field.

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::tui::app::{App, InputMode};

/// Render the input field.
pub fn render(app: &App, frame: &mut Frame, area: Rect) {
    let running = app.is_query_running();

    let border_style = match app.input_mode {
        InputMode::Editing if running => Style::default().fg(Color::DarkGray),
        InputMode::Editing => Style::default().fg(Color::Yellow),
        InputMode::Normal => Style::default().fg(Color::DarkGray),
    };

    let title = if running {
        format!(" Query [{}] (waiting for answer...) ", app.mode)
    } else {
        format!(" Query [{}] ", app.mode)
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border_style);

    let inner_area = block.inner(area);

    // Build input text with cursor
    let input_text = if app.input_mode == InputMode::Editing {
        format!("{}_", app.input_buffer)
    } else if app.input_buffer.is_empty() {
        "Press 'i' to ask a question, '/help' for commands".to_string()
    } else {
        app.input_buffer.clone()
    };

    let text_style = if app.input_mode == InputMode::Editing {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    // Keep the end of long input visible.
    let width = inner_area.width.saturating_sub(1) as usize;
    let chars = app.input_buffer.chars().count();
    let scroll = chars.saturating_sub(width) as u16;

    let input = Paragraph::new(input_text)
        .style(text_style)
        .scroll((0, scroll))
        .block(block);

    frame.render_widget(input, area);

    if app.input_mode == InputMode::Editing {
        let cursor_x = inner_area.x + (chars as u16).saturating_sub(scroll);
        let cursor_y = inner_area.y;
        frame.set_cursor_position(Position::new(cursor_x, cursor_y));
    }
}
