//! Conversion from backend graph data to renderable node/edge sets.
//!
//! The output mirrors vis-network's DataSet items field for field, so the
//! browser view can load it unchanged and the terminal view can read the same
//! styling decisions.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::models::GraphData;
use crate::config::LABEL_FONT_SIZE;

/// Most properties listed in a node's hover text.
const TITLE_PROPERTY_LIMIT: usize = 8;

/// Node size without any edge.
const BASE_NODE_SIZE: u32 = 10;

/// Degree beyond which node size stops growing.
const MAX_SIZE_RANK: usize = 10;

// =============================================================================
// Styling
// =============================================================================

/// Color theme for the rendered graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// Fixed colors of one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub node_background: &'static str,
    pub node_border: &'static str,
    pub edge: &'static str,
    pub font: &'static str,
}

impl Theme {
    pub fn palette(self) -> Palette {
        match self {
            Theme::Dark => Palette {
                node_background: "#1f6feb",
                node_border: "#58a6ff",
                edge: "#8b949e",
                font: "#e6edf3",
            },
            Theme::Light => Palette {
                node_background: "#0969da",
                node_border: "#0550ae",
                edge: "#57606a",
                font: "#1f2328",
            },
        }
    }
}

/// Display toggles applied by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterOptions {
    pub show_labels: bool,
    pub hide_isolated: bool,
    pub theme: Theme,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            show_labels: true,
            hide_isolated: false,
            theme: Theme::default(),
        }
    }
}

impl AdapterOptions {
    /// Label font size. Labels are toggled through the size, not by removing
    /// them, so the layout does not move when they are switched.
    pub fn font_size(&self) -> u32 {
        if self.show_labels {
            LABEL_FONT_SIZE
        } else {
            0
        }
    }
}

// =============================================================================
// Output Models
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeColor {
    pub background: &'static str,
    pub border: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    pub size: u32,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeColor {
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Smooth {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// A node ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisNode {
    pub id: String,
    /// Empty when labels are off.
    pub label: String,
    /// Hover text: full label plus properties.
    pub title: String,
    pub color: NodeColor,
    pub font: Font,
    pub size: u32,
    /// Set for isolated nodes while the isolation filter is on.
    pub hidden: bool,
}

/// An edge ready for rendering. Both endpoints are known nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisEdge {
    pub id: String,
    pub from: String,
    pub to: String,
    pub label: String,
    pub arrows: &'static str,
    pub color: EdgeColor,
    pub font: Font,
    pub smooth: Smooth,
}

/// Result of adapting one graph snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdaptedGraph {
    pub nodes: Vec<VisNode>,
    pub edges: Vec<VisEdge>,
    /// Edges dropped because an endpoint is unknown.
    pub dropped_edges: usize,
}

impl AdaptedGraph {
    pub fn visible_nodes(&self) -> impl Iterator<Item = &VisNode> {
        self.nodes.iter().filter(|n| !n.hidden)
    }

    pub fn hidden_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.hidden).count()
    }
}

// =============================================================================
// Adapter
// =============================================================================

/// Adapt a backend graph for rendering.
///
/// - An edge is kept iff both endpoints are known node ids.
/// - A node is isolated iff no kept edge touches it; with `hide_isolated`
///   such nodes are flagged `hidden` but stay in the set.
pub fn adapt(data: &GraphData, options: &AdapterOptions) -> AdaptedGraph {
    let palette = options.theme.palette();
    let font = Font {
        size: options.font_size(),
        color: palette.font,
    };

    let known: HashSet<&str> = data.nodes.iter().map(|n| n.id.as_str()).collect();
    let mut degree: HashMap<&str, usize> = HashMap::new();
    let mut edges = Vec::with_capacity(data.edges.len());
    let mut dropped_edges = 0;

    for (index, edge) in data.edges.iter().enumerate() {
        if !known.contains(edge.from.as_str()) || !known.contains(edge.to.as_str()) {
            dropped_edges += 1;
            continue;
        }

        *degree.entry(edge.from.as_str()).or_default() += 1;
        *degree.entry(edge.to.as_str()).or_default() += 1;

        edges.push(VisEdge {
            id: format!("{}->{}#{}", edge.from, edge.to, index),
            from: edge.from.clone(),
            to: edge.to.clone(),
            label: if options.show_labels {
                edge.label.clone()
            } else {
                String::new()
            },
            arrows: "to",
            color: EdgeColor {
                color: palette.edge,
            },
            font: font.clone(),
            smooth: Smooth {
                enabled: true,
                kind: "continuous",
            },
        });
    }

    if dropped_edges > 0 {
        tracing::debug!(dropped_edges, "dropped edges with unknown endpoints");
    }

    let nodes = data
        .nodes
        .iter()
        .map(|node| {
            let rank = degree.get(node.id.as_str()).copied().unwrap_or(0);
            VisNode {
                id: node.id.clone(),
                label: if options.show_labels {
                    node.label.clone()
                } else {
                    String::new()
                },
                title: hover_text(&node.label, &node.properties),
                color: NodeColor {
                    background: palette.node_background,
                    border: palette.node_border,
                },
                font: font.clone(),
                size: BASE_NODE_SIZE + 2 * rank.min(MAX_SIZE_RANK) as u32,
                hidden: options.hide_isolated && rank == 0,
            }
        })
        .collect();

    AdaptedGraph {
        nodes,
        edges,
        dropped_edges,
    }
}

fn hover_text(label: &str, properties: &serde_json::Map<String, Value>) -> String {
    let mut lines = vec![label.to_string()];
    lines.extend(
        properties
            .iter()
            .take(TITLE_PROPERTY_LIMIT)
            .map(|(key, value)| match value {
                Value::String(s) => format!("{key}: {s}"),
                other => format!("{key}: {other}"),
            }),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphEdge, GraphNode};

    fn sample() -> GraphData {
        GraphData::new(
            vec![
                GraphNode::new("a", "Alice").with_property("entity_type", "person"),
                GraphNode::new("b", "Bob"),
                GraphNode::new("c", "Carol"),
            ],
            vec![
                GraphEdge::new("a", "b", "knows"),
                GraphEdge::new("a", "ghost", "haunts"),
            ],
        )
    }

    #[test]
    fn test_dangling_edges_dropped() {
        let adapted = adapt(&sample(), &AdapterOptions::default());
        assert_eq!(adapted.edges.len(), 1);
        assert_eq!(adapted.dropped_edges, 1);
        assert_eq!(adapted.edges[0].from, "a");
        assert_eq!(adapted.edges[0].arrows, "to");
        assert!(adapted.edges[0].smooth.enabled);
        assert_eq!(adapted.edges[0].smooth.kind, "continuous");
    }

    #[test]
    fn test_labels_toggle_via_font_size() {
        let shown = adapt(&sample(), &AdapterOptions::default());
        assert_eq!(shown.nodes[0].label, "Alice");
        assert_eq!(shown.nodes[0].font.size, 14);
        assert_eq!(shown.edges[0].label, "knows");

        let hidden = adapt(
            &sample(),
            &AdapterOptions {
                show_labels: false,
                ..AdapterOptions::default()
            },
        );
        assert_eq!(hidden.nodes[0].label, "");
        assert_eq!(hidden.nodes[0].font.size, 0);
        assert_eq!(hidden.edges[0].label, "");
        assert_eq!(hidden.edges[0].font.size, 0);
        // Hover text keeps the full label either way.
        assert!(hidden.nodes[0].title.starts_with("Alice"));
    }

    #[test]
    fn test_isolated_nodes_hidden_not_removed() {
        let adapted = adapt(
            &sample(),
            &AdapterOptions {
                hide_isolated: true,
                ..AdapterOptions::default()
            },
        );
        assert_eq!(adapted.nodes.len(), 3);
        let hidden: Vec<&str> = adapted
            .nodes
            .iter()
            .filter(|n| n.hidden)
            .map(|n| n.id.as_str())
            .collect();
        // Alice's edge to "ghost" is dropped, but Alice still has Bob.
        assert_eq!(hidden, vec!["c"]);
    }

    #[test]
    fn test_node_size_scales_with_degree() {
        let adapted = adapt(&sample(), &AdapterOptions::default());
        assert_eq!(adapted.nodes[0].size, 12);
        assert_eq!(adapted.nodes[2].size, 10);
    }

    #[test]
    fn test_theme_colors() {
        let light = adapt(
            &sample(),
            &AdapterOptions {
                theme: Theme::Light,
                ..AdapterOptions::default()
            },
        );
        assert_eq!(light.nodes[0].color.background, Theme::Light.palette().node_background);
    }

    #[test]
    fn test_serializes_vis_network_shape() {
        let adapted = adapt(&sample(), &AdapterOptions::default());
        let json = serde_json::to_value(&adapted.edges[0]).unwrap();
        assert_eq!(json["smooth"]["type"], "continuous");
        assert_eq!(json["font"]["size"], 14);
        let node = serde_json::to_value(&adapted.nodes[0]).unwrap();
        assert_eq!(node["hidden"], false);
        assert_eq!(node["color"]["border"], "#58a6ff");
    }
}
