use ragdeck_core::config::PhysicsConfig;
use ragdeck_core::graph::{
    AdapterOptions, GraphData, GraphEdge, GraphNode, NetworkView, ViewError, ViewState,
};

fn sample() -> GraphData {
    GraphData::new(
        vec![
            GraphNode::new("alice", "Alice").with_property("role", "engineer"),
            GraphNode::new("bob", "Bob"),
            GraphNode::new("carol", "Carol"),
            GraphNode::new("dave", "Dave"),
        ],
        vec![
            GraphEdge::new("alice", "bob", "knows"),
            GraphEdge::new("bob", "carol", "reports_to"),
            GraphEdge::new("carol", "nobody", "dangling"),
        ],
    )
}

fn settle(view: &mut NetworkView) {
    let mut ticks = 0;
    while view.state() == ViewState::Stabilizing {
        view.tick();
        ticks += 1;
        assert!(ticks <= 10_000, "layout never settled");
    }
}

#[test]
fn test_mount_then_fit_exactly_once() {
    let mut view = NetworkView::new(PhysicsConfig::default(), 160.0, 48.0);
    assert_eq!(view.state(), ViewState::Uninitialized);

    view.mount(sample(), AdapterOptions::default()).unwrap();
    assert_eq!(view.state(), ViewState::Stabilizing);
    assert_eq!(view.fit_count(), 0);

    settle(&mut view);
    assert_eq!(view.state(), ViewState::Ready);
    assert_eq!(view.fit_count(), 1);

    let viewport = view.viewport().unwrap();
    for _ in 0..50 {
        assert!(!view.tick());
    }
    assert_eq!(view.viewport(), Some(viewport));
    assert_eq!(view.fit_count(), 1);
}

#[test]
fn test_destroy_and_recreate_is_idempotent() {
    let data = sample();
    let retained_edges = 2;

    let mut first = NetworkView::new(PhysicsConfig::default(), 160.0, 48.0);
    first.mount(data.clone(), AdapterOptions::default()).unwrap();
    assert_eq!(first.node_count(), data.nodes.len());
    assert_eq!(first.edge_count(), retained_edges);
    first.destroy();
    assert_eq!(first.node_count(), 0);

    let mut second = NetworkView::new(PhysicsConfig::default(), 160.0, 48.0);
    second.mount(data.clone(), AdapterOptions::default()).unwrap();
    assert_eq!(second.node_count(), data.nodes.len());
    assert_eq!(second.edge_count(), retained_edges);
}

#[test]
fn test_duplicate_node_ids_leave_view_empty() {
    let mut data = sample();
    data.nodes.push(GraphNode::new("bob", "Other Bob"));

    let mut view = NetworkView::new(PhysicsConfig::default(), 160.0, 48.0);
    let err = view.mount(data, AdapterOptions::default()).unwrap_err();
    assert_eq!(err, ViewError::DuplicateNode("bob".to_string()));
    assert_eq!(view.state(), ViewState::Uninitialized);
    assert_eq!(view.node_count(), 0);
    assert!(view.placed_nodes().is_empty());

    // A valid payload afterwards mounts normally.
    view.update(sample(), AdapterOptions::default()).unwrap();
    assert_eq!(view.state(), ViewState::Stabilizing);
}

#[test]
fn test_data_change_rebuilds() {
    let mut view = NetworkView::new(PhysicsConfig::default(), 160.0, 48.0);
    view.mount(sample(), AdapterOptions::default()).unwrap();
    settle(&mut view);

    let mut grown = sample();
    grown.nodes.push(GraphNode::new("erin", "Erin"));
    grown.edges.push(GraphEdge::new("erin", "alice", "knows"));
    view.update(grown, AdapterOptions::default()).unwrap();

    assert_eq!(view.state(), ViewState::Stabilizing);
    assert_eq!(view.node_count(), 5);
    settle(&mut view);
    assert_eq!(view.fit_count(), 2);
}

#[test]
fn test_hide_isolated_keeps_node_in_set() {
    let mut view = NetworkView::new(PhysicsConfig::default(), 160.0, 48.0);
    view.mount(
        sample(),
        AdapterOptions {
            hide_isolated: true,
            ..AdapterOptions::default()
        },
    )
    .unwrap();

    assert_eq!(view.node_count(), 4);
    let placed: Vec<&str> = view
        .placed_nodes()
        .iter()
        .map(|p| p.node.id.as_str())
        .collect();
    assert!(!placed.contains(&"dave"));
    assert_eq!(placed.len(), 3);
}

#[test]
fn test_click_selects_node() {
    let mut view = NetworkView::new(PhysicsConfig::default(), 160.0, 48.0);
    view.mount(sample(), AdapterOptions::default()).unwrap();
    settle(&mut view);

    let alice = view
        .placed_nodes()
        .into_iter()
        .find(|p| p.node.id == "alice")
        .map(|p| p.position)
        .unwrap();

    let mut selected = None;
    assert!(view.click(alice.x, alice.y, |node| selected = Some(node.clone())));
    let node = selected.unwrap();
    assert_eq!(node.label, "Alice");
    assert_eq!(node.properties["role"], "engineer");
}

#[test]
fn test_click_on_empty_space_is_noop() {
    let mut view = NetworkView::new(PhysicsConfig::default(), 160.0, 48.0);
    view.mount(sample(), AdapterOptions::default()).unwrap();
    settle(&mut view);

    let mut called = false;
    assert!(!view.click(-5_000.0, -5_000.0, |_| called = true));
    assert!(!called);
}

#[test]
fn test_resize_keeps_instance() {
    let mut view = NetworkView::new(PhysicsConfig::default(), 160.0, 48.0);
    view.mount(sample(), AdapterOptions::default()).unwrap();
    settle(&mut view);

    view.resize(80.0, 24.0);
    let viewport = view.viewport().unwrap();
    assert_eq!(viewport.width, 80.0);
    assert_eq!(viewport.height, 24.0);
    assert_eq!(view.state(), ViewState::Ready);
    assert_eq!(view.fit_count(), 1);
}

#[test]
fn test_layout_settled_off_screen_fits_once_shown() {
    let mut view = NetworkView::new(PhysicsConfig::default(), 0.0, 0.0);
    view.mount(sample(), AdapterOptions::default()).unwrap();

    for _ in 0..5_000 {
        assert!(!view.tick());
    }
    assert_eq!(view.state(), ViewState::Stabilizing);
    assert_eq!(view.fit_count(), 0);

    view.resize(100.0, 40.0);
    assert!(view.tick());
    assert_eq!(view.state(), ViewState::Ready);
    assert_eq!(view.fit_count(), 1);

    let positions: Vec<_> = view.placed_nodes().iter().map(|p| p.position).collect();
    let spread_x = positions.iter().map(|p| p.x).fold(f64::MIN, f64::max)
        - positions.iter().map(|p| p.x).fold(f64::MAX, f64::min);
    let spread_y = positions.iter().map(|p| p.y).fold(f64::MIN, f64::max)
        - positions.iter().map(|p| p.y).fold(f64::MAX, f64::min);
    assert!(spread_x.max(spread_y) > 10.0, "nodes collapsed: {positions:?}");
}
