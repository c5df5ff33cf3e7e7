//! Invariants of the graph adapter over generated graphs.

use std::collections::HashSet;

use proptest::prelude::*;
use ragdeck_core::graph::{adapt, AdapterOptions, GraphData, GraphEdge, GraphNode, Theme};

/// Graphs with ids drawn from a small pool, so edges hit real nodes, dangle,
/// and self-loop in roughly equal measure.
fn graph_strategy() -> impl Strategy<Value = GraphData> {
    let ids = prop::sample::subsequence((0..12).collect::<Vec<u32>>(), 0..=12);
    let edges = prop::collection::vec((0u32..16, 0u32..16, "[a-z]{0,6}"), 0..24);

    (ids, edges).prop_map(|(ids, edges)| {
        GraphData::new(
            ids.iter()
                .map(|i| GraphNode::new(format!("n{i}"), format!("Node {i}")))
                .collect(),
            edges
                .into_iter()
                .map(|(from, to, label)| GraphEdge::new(format!("n{from}"), format!("n{to}"), label))
                .collect(),
        )
    })
}

fn options_strategy() -> impl Strategy<Value = AdapterOptions> {
    (any::<bool>(), any::<bool>(), prop_oneof![Just(Theme::Dark), Just(Theme::Light)]).prop_map(
        |(show_labels, hide_isolated, theme)| AdapterOptions {
            show_labels,
            hide_isolated,
            theme,
        },
    )
}

proptest! {
    #[test]
    fn edges_only_reference_known_nodes(data in graph_strategy(), options in options_strategy()) {
        let adapted = adapt(&data, &options);
        let ids: HashSet<&str> = adapted.nodes.iter().map(|n| n.id.as_str()).collect();
        for edge in &adapted.edges {
            prop_assert!(ids.contains(edge.from.as_str()));
            prop_assert!(ids.contains(edge.to.as_str()));
        }
        prop_assert_eq!(adapted.edges.len() + adapted.dropped_edges, data.edges.len());
        prop_assert_eq!(adapted.nodes.len(), data.nodes.len());
    }

    #[test]
    fn label_toggle_keeps_identity(data in graph_strategy(), hide_isolated in any::<bool>()) {
        let shown = adapt(&data, &AdapterOptions { show_labels: true, hide_isolated, ..AdapterOptions::default() });
        let hidden = adapt(&data, &AdapterOptions { show_labels: false, hide_isolated, ..AdapterOptions::default() });

        let shown_ids: Vec<&str> = shown.nodes.iter().map(|n| n.id.as_str()).collect();
        let hidden_ids: Vec<&str> = hidden.nodes.iter().map(|n| n.id.as_str()).collect();
        prop_assert_eq!(shown_ids, hidden_ids);

        let shown_edges: Vec<&str> = shown.edges.iter().map(|e| e.id.as_str()).collect();
        let hidden_edges: Vec<&str> = hidden.edges.iter().map(|e| e.id.as_str()).collect();
        prop_assert_eq!(shown_edges, hidden_edges);

        for (a, b) in shown.nodes.iter().zip(&hidden.nodes) {
            prop_assert_eq!(a.hidden, b.hidden);
            prop_assert_eq!(a.size, b.size);
            prop_assert_eq!(a.font.size, 14);
            prop_assert_eq!(b.font.size, 0);
            prop_assert_eq!(b.label.as_str(), "");
        }
        for edge in &hidden.edges {
            prop_assert_eq!(edge.label.as_str(), "");
        }
    }

    #[test]
    fn hidden_iff_no_retained_edge(data in graph_strategy()) {
        let adapted = adapt(&data, &AdapterOptions { hide_isolated: true, ..AdapterOptions::default() });
        let touched: HashSet<&str> = adapted
            .edges
            .iter()
            .flat_map(|e| [e.from.as_str(), e.to.as_str()])
            .collect();
        for node in &adapted.nodes {
            prop_assert_eq!(node.hidden, !touched.contains(node.id.as_str()));
        }

        let shown = adapt(&data, &AdapterOptions::default());
        prop_assert!(shown.nodes.iter().all(|n| !n.hidden));
    }
}

#[test]
fn empty_graph_hides_nothing() {
    let adapted = adapt(
        &GraphData::default(),
        &AdapterOptions {
            hide_isolated: true,
            ..AdapterOptions::default()
        },
    );
    assert!(adapted.nodes.is_empty());
    assert_eq!(adapted.hidden_count(), 0);
}

#[test]
fn disconnected_graph_hides_everything() {
    let data = GraphData::new(
        (0..5)
            .map(|i| GraphNode::new(format!("n{i}"), "x"))
            .collect(),
        vec![GraphEdge::new("n0", "missing", "dangling")],
    );
    let adapted = adapt(
        &data,
        &AdapterOptions {
            hide_isolated: true,
            ..AdapterOptions::default()
        },
    );
    assert_eq!(adapted.hidden_count(), 5);
    assert_eq!(adapted.visible_nodes().count(), 0);
}
