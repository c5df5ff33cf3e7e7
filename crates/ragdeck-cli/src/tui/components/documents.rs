//! Document table component.

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Paragraph, Row, Table, TableState},
};

use crate::tui::app::App;

/// Render the document list.
pub fn render(app: &App, frame: &mut Frame, area: Rect) {
    let title = if app.documents_loading {
        " Documents (loading...) ".to_string()
    } else {
        format!(" Documents ({}) ", app.documents.len())
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray));

    if app.documents.is_empty() {
        let empty = Paragraph::new("No documents. Use /upload <files..> to add .txt or .csv files.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(["DOC ID", "STATUS", "CHUNKS", "UPDATED", "PREVIEW"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows = app.documents.iter().map(|doc| {
        let status_style = match doc.status.to_ascii_lowercase().as_str() {
            "processed" => Style::default().fg(Color::Green),
            "failed" => Style::default().fg(Color::Red),
            _ => Style::default().fg(Color::Yellow),
        };
        Row::new(vec![
            Line::raw(doc.doc_id.as_str()),
            Line::styled(doc.status.as_str(), status_style),
            Line::raw(doc.chunks_count.map(|c| c.to_string()).unwrap_or_default()),
            Line::raw(doc.updated_at.as_str()),
            Line::raw(doc.preview()),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(36),
            Constraint::Length(11),
            Constraint::Length(7),
            Constraint::Length(20),
            Constraint::Min(20),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(Style::default().bg(Color::DarkGray))
    .highlight_symbol("> ");

    let mut state = TableState::default().with_selected(Some(app.doc_selected));
    frame.render_stateful_widget(table, area, &mut state);
}
