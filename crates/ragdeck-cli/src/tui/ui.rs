//! UI rendering for the TUI.

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use super::app::{App, InputMode, SelectedTab};
use super::commands::SlashCommand;
use super::components::{chat, documents, graph, input, status, tabs};

/// Screen regions, top to bottom.
struct Regions {
    backdrop: Rect,
    tabs: Rect,
    content: Rect,
    input: Rect,
    status: Rect,
}

fn regions(area: Rect) -> Regions {
    let [backdrop, tabs, content, input, status] = Layout::vertical([
        Constraint::Length(2),  // Backdrop
        Constraint::Length(2),  // Tab bar
        Constraint::Min(10),    // Main content
        Constraint::Length(3),  // Input
        Constraint::Length(1),  // Status bar
    ])
    .areas(area);

    Regions {
        backdrop,
        tabs,
        content,
        input,
        status,
    }
}

/// Chat on the left, graph panel on the right.
fn chat_split(area: Rect) -> [Rect; 2] {
    Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(area)
}

/// Where the graph canvas lands for the current tab, if it is shown at all.
pub fn graph_canvas_area(app: &App, area: Rect) -> Option<Rect> {
    let content = regions(area).content;
    match app.selected_tab {
        SelectedTab::Chat if app.show_graph_panel => {
            let [_, panel] = chat_split(content);
            Some(graph::canvas_area(panel, false))
        }
        SelectedTab::Graph => Some(graph::canvas_area(content, true)),
        _ => None,
    }
}

/// Render the entire UI.
pub fn render(app: &App, frame: &mut Frame) {
    let regions = regions(frame.area());

    let backdrop = Paragraph::new(app.backdrop.lines(regions.backdrop.height))
        .style(Style::default().fg(Color::Blue));
    frame.render_widget(backdrop, regions.backdrop);

    tabs::render(app, frame, regions.tabs);
    render_main_content(app, frame, regions.content);
    input::render(app, frame, regions.input);
    status::render(app, frame, regions.status);

    if app.show_help {
        render_help(app, frame);
    }
}

fn render_main_content(app: &App, frame: &mut Frame, area: Rect) {
    match app.selected_tab {
        SelectedTab::Chat if app.show_graph_panel => {
            let [left, right] = chat_split(area);
            chat::render(app, frame, left);
            graph::render(app, frame, right, false);
        }
        SelectedTab::Chat => chat::render(app, frame, area),
        SelectedTab::Graph => graph::render(app, frame, area, true),
        SelectedTab::Documents => documents::render(app, frame, area),
    }
}

fn render_help(app: &App, frame: &mut Frame) {
    let area = centered_rect(60, 70, frame.area());

    let key_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let keys: &[(&str, &str)] = match app.input_mode {
        InputMode::Editing => &[("Enter", "Send query"), ("Esc", "Stop editing")],
        InputMode::Normal => &[
            ("i / Enter", "Type a query or /command"),
            ("Tab / 1-3", "Switch tab"),
            ("m", "Cycle retrieval mode"),
            ("s", "Toggle streaming"),
            ("g", "Toggle graph panel (chat)"),
            ("r", "Refresh graph / documents"),
            ("l / h", "Toggle labels / isolated nodes"),
            ("click", "Select a graph node"),
            ("j / k", "Scroll"),
            ("q", "Quit"),
        ],
    };

    let mut lines = vec![Line::styled("Keys", Style::default().add_modifier(Modifier::BOLD))];
    lines.extend(keys.iter().map(|(key, action)| {
        Line::from(vec![
            Span::styled(format!("  {key:<12}"), key_style),
            Span::raw(*action),
        ])
    }));
    lines.push(Line::default());
    lines.push(Line::styled("Commands", Style::default().add_modifier(Modifier::BOLD)));
    lines.extend(SlashCommand::help_lines().iter().map(|(command, action)| {
        Line::from(vec![
            Span::styled(format!("  {command:<24}"), key_style),
            Span::raw(*action),
        ])
    }));

    let help = Paragraph::new(lines).block(
        Block::default()
            .title(" Help (any key to close) ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Yellow)),
    );

    frame.render_widget(Clear, area);
    frame.render_widget(help, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);

    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);

    center
}
