//! Knowledge graph canvas and node details panel.

use ratatui::{
    prelude::*,
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Circle, Line as CanvasLine},
        Block, BorderType, Borders, Paragraph, Wrap,
    },
};
use serde_json::Value;

use ragdeck_core::graph::{GraphNode, ViewState};

use crate::tui::app::{surface_size, App};

const DETAILS_WIDTH: u16 = 34;

fn split(area: Rect, with_details: bool) -> (Rect, Option<Rect>) {
    if with_details {
        let [graph, details] =
            Layout::horizontal([Constraint::Min(20), Constraint::Length(DETAILS_WIDTH)]).areas(area);
        (graph, Some(details))
    } else {
        (area, None)
    }
}

fn bordered() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray))
}

/// The drawable surface inside the graph panel.
pub fn canvas_area(area: Rect, with_details: bool) -> Rect {
    bordered().inner(split(area, with_details).0)
}

fn hex_color(hex: &str) -> Color {
    hex.parse().unwrap_or(Color::Gray)
}

/// Render the graph panel.
pub fn render(app: &App, frame: &mut Frame, area: Rect, with_details: bool) {
    let (graph_area, details_area) = split(area, with_details);

    let mut title = format!(
        " Knowledge Graph ({} nodes, {} edges) ",
        app.view.node_count(),
        app.view.edge_count()
    );
    if app.view.state() == ViewState::Stabilizing {
        title.push_str("settling... ");
    }
    let block = bordered().title(title);
    let canvas_area = block.inner(graph_area);
    frame.render_widget(block, graph_area);

    if let Some(details) = details_area {
        render_details(app, frame, details);
    }

    if app.view.node_count() == 0 {
        let text = if app.graph_loading {
            "Loading knowledge graph..."
        } else {
            "No graph data. Upload documents, then press 'r' on the Graph tab."
        };
        let placeholder = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: true });
        frame.render_widget(placeholder, canvas_area);
        return;
    }

    let (width, height) = surface_size(canvas_area);
    let scale = app.view.viewport().map_or(1.0, |v| v.scale);
    let nodes = app.view.placed_nodes();
    let edges = app.view.placed_edges();
    let selected = app.selected_node.as_ref().map(|n| n.id.as_str());

    // Surface y grows downwards, canvas y upwards.
    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([0.0, width])
        .y_bounds([0.0, height])
        .paint(|ctx| {
            for edge in &edges {
                ctx.draw(&CanvasLine::new(
                    edge.from.x,
                    height - edge.from.y,
                    edge.to.x,
                    height - edge.to.y,
                    hex_color(edge.edge.color.color),
                ));
            }
            ctx.layer();

            for placed in &nodes {
                let color = if Some(placed.node.id.as_str()) == selected {
                    Color::Yellow
                } else {
                    hex_color(placed.node.color.background)
                };
                ctx.draw(&Circle {
                    x: placed.position.x,
                    y: height - placed.position.y,
                    radius: (placed.node.size as f64 * scale).max(0.5),
                    color,
                });
            }
            ctx.layer();

            for placed in nodes.iter().filter(|n| !n.node.label.is_empty()) {
                let style = if Some(placed.node.id.as_str()) == selected {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(hex_color(placed.node.font.color))
                };
                ctx.print(
                    placed.position.x,
                    height - placed.position.y,
                    Span::styled(placed.node.label.clone(), style),
                );
            }
        });

    frame.render_widget(canvas, canvas_area);
}

fn render_details(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().fg(Color::Cyan);
    let dim = Style::default().fg(Color::DarkGray);

    let mut lines = match &app.selected_node {
        Some(node) => node_lines(node, key_style),
        None => vec![Line::styled("Click a node to inspect it.", dim)],
    };

    let on_off = |on: bool| if on { "on" } else { "off" };
    let hidden = app.view.adapted().map_or(0, |a| a.hidden_count());
    let dropped = app.view.adapted().map_or(0, |a| a.dropped_edges);
    lines.push(Line::default());
    lines.push(Line::styled(
        format!("[l] labels: {}", on_off(app.graph_options.show_labels)),
        dim,
    ));
    lines.push(Line::styled(
        format!(
            "[h] hide isolated: {} ({hidden} hidden)",
            on_off(app.graph_options.hide_isolated)
        ),
        dim,
    ));
    if dropped > 0 {
        lines.push(Line::styled(format!("{dropped} dangling edge(s) skipped"), dim));
    }
    lines.push(Line::styled("[r] refresh", dim));

    let details = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(bordered().title(" Node "));
    frame.render_widget(details, area);
}

fn node_lines(node: &GraphNode, key_style: Style) -> Vec<Line<'_>> {
    let mut lines = vec![
        Line::styled(
            node.label.as_str(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Line::from(vec![Span::styled("id: ", key_style), Span::raw(node.id.as_str())]),
    ];
    lines.extend(node.properties.iter().map(|(key, value)| {
        Line::from(vec![
            Span::styled(format!("{key}: "), key_style),
            Span::raw(property_text(value)),
        ])
    }));
    lines
}

fn property_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
