//! Transcript display component.

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
};

use ragdeck_core::session::Message;
use ragdeck_core::Transcript;

use crate::tui::app::App;

const INDENT: &str = "       ";
const CURSOR: &str = "▌";

/// Render the transcript.
pub fn render(app: &App, frame: &mut Frame, area: Rect) {
    let title = format!(" Chat ({} mode) ", app.mode);
    render_transcript(frame, area, title, &app.transcript, app.scroll_offset);
}

/// Draw the transcript anchored to its newest row. `scroll_offset` counts
/// wrapped rows up from the bottom.
fn render_transcript(
    frame: &mut Frame,
    area: Rect,
    title: String,
    transcript: &Transcript,
    scroll_offset: usize,
) {
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();
    for (i, msg) in transcript.messages().iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        lines.extend(message_lines(msg));
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });

    let total_rows = paragraph.line_count(inner_area.width);
    let bottom = total_rows.saturating_sub(inner_area.height as usize);
    let top = bottom.saturating_sub(scroll_offset).min(u16::MAX as usize) as u16;

    frame.render_widget(paragraph.scroll((top, 0)), inner_area);
}

fn message_lines(msg: &Message) -> Vec<Line<'_>> {
    let user_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let answer_prefix = Style::default().fg(Color::Green).add_modifier(Modifier::BOLD);
    let answer_style = if msg.is_failed() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::White)
    };

    let mut lines = vec![Line::from(vec![
        Span::styled("[you] ", user_style),
        Span::styled(msg.query.as_str(), Style::default().fg(Color::White)),
        Span::styled(
            format!("  {}", msg.timestamp.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ),
    ])];

    for (i, text) in msg.lines.iter().enumerate() {
        let prefix = if i == 0 {
            Span::styled("[rag] ", answer_prefix)
        } else {
            Span::raw(INDENT)
        };
        lines.push(Line::from(vec![prefix, Span::styled(text.as_str(), answer_style)]));
    }

    if msg.streaming {
        let cursor = Span::styled(CURSOR, Style::default().fg(Color::Green));
        match lines.last_mut() {
            Some(last) if !msg.lines.is_empty() => last.push_span(cursor),
            _ => lines.push(Line::from(vec![Span::styled("[rag] ", answer_prefix), cursor])),
        }
    }

    if let Some(error) = &msg.error {
        lines.push(Line::from(vec![
            Span::styled("[err] ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::styled(error.as_str(), Style::default().fg(Color::Red)),
        ]));
    }

    if let Some(total) = msg.metrics.and_then(|m| m.total) {
        lines.push(Line::styled(
            format!("{INDENT}answered in {:.2}s", total.as_secs_f64()),
            Style::default().fg(Color::DarkGray),
        ));
    }

    lines
}
