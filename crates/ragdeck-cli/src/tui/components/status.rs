//! Status bar: backend health, query settings, last metrics and notices.

use ratatui::{prelude::*, widgets::Paragraph};

use crate::tui::app::{App, InputMode, NoticeKind};

/// Render the status bar.
pub fn render(app: &App, frame: &mut Frame, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);

    let (dot_color, health) = match &app.health {
        Some(h) if h.is_healthy() => (Color::Green, h.status.as_str()),
        Some(h) => (Color::Red, h.status.as_str()),
        None => (Color::DarkGray, "checking"),
    };

    let mut spans = vec![
        Span::styled("● ", Style::default().fg(dot_color)),
        Span::styled(health, dim),
        Span::styled(format!("  |  mode: {}", app.mode), dim),
        Span::styled(
            format!("  |  stream: {}", if app.stream { "on" } else { "off" }),
            dim,
        ),
    ];

    if let Some(metrics) = app.last_metrics {
        let secs = |d: Option<std::time::Duration>| {
            d.map_or_else(|| "-".to_string(), |d| format!("{:.2}s", d.as_secs_f64()))
        };
        spans.push(Span::styled(
            format!(
                "  |  context {} / total {}",
                secs(metrics.context_build),
                secs(metrics.total)
            ),
            dim,
        ));
    }

    spans.push(Span::styled("  |  ", dim));
    match app.current_notice() {
        Some(notice) => {
            let color = match notice.kind {
                NoticeKind::Info => Color::Cyan,
                NoticeKind::Error => Color::Red,
            };
            spans.push(Span::styled(notice.text.as_str(), Style::default().fg(color)));
        }
        None => {
            let hint = match app.input_mode {
                InputMode::Normal => "[i] Ask  [Tab] Switch  [m] Mode  [s] Stream  [?] Help  [q] Quit",
                InputMode::Editing => "[Enter] Send  [Esc] Cancel",
            };
            spans.push(Span::styled(hint, dim));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
