//! Lifecycle of a rendered graph.
//!
//! [`NetworkView`] owns at most one [`GraphInstance`]: the adapted graph, its
//! force layout and the viewport. Any change of data or display toggles
//! throws the instance away and builds a new one; the viewport is framed to
//! the content exactly once per instance, after the layout settles.

use std::collections::HashSet;

use thiserror::Error;

use super::adapter::{adapt, AdaptedGraph, AdapterOptions, VisEdge, VisNode};
use super::layout::{ForceLayout, Vec2};
use super::models::{GraphData, GraphNode};
use crate::config::PhysicsConfig;

/// Share of the surface left empty around the content when fitting.
const FIT_PADDING: f64 = 0.08;

/// Fitting never zooms in beyond this scale.
const MAX_FIT_SCALE: f64 = 1.0;

/// Smallest hit radius in surface units, so tiny nodes stay clickable.
const MIN_HIT_RADIUS: f64 = 1.5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("Graph has more than one node with id '{0}'")]
    DuplicateNode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// No instance yet (or the last data was empty or rejected).
    Uninitialized,
    /// Instance built, layout still moving, viewport not yet fitted.
    Stabilizing,
    /// Viewport fitted; the instance stays here until replaced.
    Ready,
    /// Torn down; every later call is a no-op.
    Destroyed,
}

/// Maps layout coordinates onto the drawing surface.
///
/// Surface coordinates have their origin at the top-left corner with `y`
/// growing downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Vec2,
    pub scale: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    fn new(width: f64, height: f64) -> Self {
        Self {
            center: Vec2::ZERO,
            scale: 1.0,
            width,
            height,
        }
    }

    pub fn to_surface(&self, world: Vec2) -> Vec2 {
        let offset = (world - self.center) * self.scale;
        Vec2::new(offset.x + self.width / 2.0, offset.y + self.height / 2.0)
    }

    pub fn to_world(&self, surface: Vec2) -> Vec2 {
        let offset = Vec2::new(surface.x - self.width / 2.0, surface.y - self.height / 2.0);
        offset * (1.0 / self.scale) + self.center
    }
}

/// A visible node with its surface position.
#[derive(Debug, Clone, Copy)]
pub struct PlacedNode<'a> {
    pub node: &'a VisNode,
    pub position: Vec2,
}

/// An edge between two visible nodes, in surface coordinates.
#[derive(Debug, Clone, Copy)]
pub struct PlacedEdge<'a> {
    pub edge: &'a VisEdge,
    pub from: Vec2,
    pub to: Vec2,
}

/// One constructed rendering of one graph snapshot.
#[derive(Debug)]
struct GraphInstance {
    source: GraphData,
    adapted: AdaptedGraph,
    layout: ForceLayout,
    viewport: Viewport,
    fitted: bool,
}

impl GraphInstance {
    fn build(
        source: GraphData,
        options: &AdapterOptions,
        physics: &PhysicsConfig,
        width: f64,
        height: f64,
    ) -> Result<Self, ViewError> {
        let mut seen = HashSet::with_capacity(source.nodes.len());
        if let Some(dup) = source.nodes.iter().find(|n| !seen.insert(n.id.as_str())) {
            return Err(ViewError::DuplicateNode(dup.id.clone()));
        }

        let adapted = adapt(&source, options);
        let layout = ForceLayout::new(&adapted, physics.clone());

        Ok(Self {
            source,
            adapted,
            layout,
            viewport: Viewport::new(width, height),
            fitted: false,
        })
    }

    fn fit(&mut self) {
        let viewport = &mut self.viewport;
        if let Some(bounds) = self.layout.bounds() {
            let usable_w = viewport.width * (1.0 - 2.0 * FIT_PADDING);
            let usable_h = viewport.height * (1.0 - 2.0 * FIT_PADDING);
            let scale_x = usable_w / bounds.width().max(1.0);
            let scale_y = usable_h / bounds.height().max(1.0);
            viewport.center = bounds.center();
            viewport.scale = scale_x.min(scale_y).clamp(f64::EPSILON, MAX_FIT_SCALE);
        }
        self.fitted = true;
    }
}

/// Owner of the graph rendering lifecycle.
///
/// # Example
///
/// ```ignore
/// let mut view = NetworkView::new(PhysicsConfig::default(), 120.0, 40.0);
/// view.mount(graph, AdapterOptions::default())?;
/// while view.state() == ViewState::Stabilizing {
///     view.tick();
/// }
/// ```
#[derive(Debug)]
pub struct NetworkView {
    state: ViewState,
    instance: Option<GraphInstance>,
    options: AdapterOptions,
    physics: PhysicsConfig,
    width: f64,
    height: f64,
    fits: u32,
}

impl NetworkView {
    pub fn new(physics: PhysicsConfig, width: f64, height: f64) -> Self {
        Self {
            state: ViewState::Uninitialized,
            instance: None,
            options: AdapterOptions::default(),
            physics,
            width,
            height,
            fits: 0,
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn options(&self) -> AdapterOptions {
        self.options
    }

    /// First construction. On an already mounted view this behaves like
    /// [`NetworkView::update`].
    pub fn mount(&mut self, data: GraphData, options: AdapterOptions) -> Result<(), ViewError> {
        if self.state != ViewState::Uninitialized {
            return self.update(data, options);
        }
        self.rebuild(data, options)
    }

    /// Replace the data and/or display toggles.
    ///
    /// Identical input keeps the current instance; anything else destroys it
    /// and builds a new one, which will be fitted again once it settles.
    pub fn update(&mut self, data: GraphData, options: AdapterOptions) -> Result<(), ViewError> {
        match self.state {
            ViewState::Destroyed => return Ok(()),
            ViewState::Uninitialized => {}
            ViewState::Stabilizing | ViewState::Ready => {
                let unchanged = self
                    .instance
                    .as_ref()
                    .is_some_and(|i| i.source == data && self.options == options);
                if unchanged {
                    return Ok(());
                }
            }
        }
        self.rebuild(data, options)
    }

    /// Rebuild with new display toggles and the current data.
    pub fn set_options(&mut self, options: AdapterOptions) -> Result<(), ViewError> {
        let data = self.source().cloned().unwrap_or_default();
        self.update(data, options)
    }

    fn rebuild(&mut self, data: GraphData, options: AdapterOptions) -> Result<(), ViewError> {
        self.instance = None;
        self.options = options;
        self.state = ViewState::Uninitialized;

        if data.is_empty() {
            return Ok(());
        }

        let instance = GraphInstance::build(data, &options, &self.physics, self.width, self.height)
            .inspect_err(|e| tracing::warn!(error = %e, "graph view construction failed"))?;

        tracing::debug!(
            nodes = instance.adapted.nodes.len(),
            edges = instance.adapted.edges.len(),
            hidden = instance.adapted.hidden_count(),
            "graph view constructed"
        );
        self.instance = Some(instance);
        self.state = ViewState::Stabilizing;
        Ok(())
    }

    /// Advance the physics by one step. Returns true when this tick fitted
    /// the viewport.
    pub fn tick(&mut self) -> bool {
        if self.state != ViewState::Stabilizing || !self.physics.enabled {
            return false;
        }
        let has_surface = self.has_surface();
        let Some(instance) = self.instance.as_mut() else {
            return false;
        };

        // A settled layout waits in Stabilizing until there is a surface to
        // fit into.
        if instance.layout.step() && has_surface && !instance.fitted {
            instance.fit();
            self.fits += 1;
            self.state = ViewState::Ready;
            tracing::debug!(iterations = instance.layout.iterations(), "graph layout stabilized");
            return true;
        }
        false
    }

    /// Signal that a frame was drawn. Without physics the first draw fits the
    /// viewport.
    pub fn mark_drawn(&mut self) {
        if self.state != ViewState::Stabilizing || self.physics.enabled || !self.has_surface() {
            return;
        }
        if let Some(instance) = self.instance.as_mut() {
            if !instance.fitted {
                instance.fit();
                self.fits += 1;
                self.state = ViewState::Ready;
            }
        }
    }

    fn has_surface(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Record a new surface size. The viewport keeps its center and scale;
    /// a view still waiting for a surface fits on the next tick or draw.
    pub fn resize(&mut self, width: f64, height: f64) {
        if self.state == ViewState::Destroyed {
            return;
        }
        self.width = width;
        self.height = height;
        if let Some(instance) = self.instance.as_mut() {
            instance.viewport.width = width;
            instance.viewport.height = height;
        }
    }

    /// Resolve a surface point to a visible node and hand it to `on_select`.
    /// Returns false on a miss.
    pub fn click<F>(&self, x: f64, y: f64, on_select: F) -> bool
    where
        F: FnOnce(&GraphNode),
    {
        let Some(instance) = self.instance.as_ref() else {
            return false;
        };
        let viewport = &instance.viewport;
        let point = viewport.to_world(Vec2::new(x, y));

        let largest = instance
            .adapted
            .visible_nodes()
            .map(|n| n.size)
            .max()
            .unwrap_or(0) as f64;
        let reach = (largest * viewport.scale).max(MIN_HIT_RADIUS) / viewport.scale;

        let Some(id) = instance.layout.nearest(point, reach) else {
            return false;
        };

        // Each node is only hit within its own radius.
        let hit = instance
            .adapted
            .nodes
            .iter()
            .find(|n| n.id == id)
            .zip(instance.layout.position(id))
            .is_some_and(|(node, pos)| {
                let radius = (node.size as f64 * viewport.scale).max(MIN_HIT_RADIUS);
                pos.distance(point) * viewport.scale <= radius
            });
        if !hit {
            return false;
        }

        match instance.source.node(id) {
            Some(node) => {
                on_select(node);
                true
            }
            None => false,
        }
    }

    /// Release the instance. Later calls are no-ops.
    pub fn destroy(&mut self) {
        if self.state == ViewState::Destroyed {
            return;
        }
        self.instance = None;
        self.state = ViewState::Destroyed;
    }

    pub fn source(&self) -> Option<&GraphData> {
        self.instance.as_ref().map(|i| &i.source)
    }

    pub fn adapted(&self) -> Option<&AdaptedGraph> {
        self.instance.as_ref().map(|i| &i.adapted)
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.instance.as_ref().map(|i| i.viewport)
    }

    /// Number of viewport fits performed over the lifetime of this view.
    pub fn fit_count(&self) -> u32 {
        self.fits
    }

    pub fn node_count(&self) -> usize {
        self.adapted().map_or(0, |a| a.nodes.len())
    }

    pub fn edge_count(&self) -> usize {
        self.adapted().map_or(0, |a| a.edges.len())
    }

    /// Visible nodes in surface coordinates.
    pub fn placed_nodes(&self) -> Vec<PlacedNode<'_>> {
        let Some(instance) = self.instance.as_ref() else {
            return Vec::new();
        };
        instance
            .adapted
            .visible_nodes()
            .filter_map(|node| {
                let position = instance.viewport.to_surface(instance.layout.position(&node.id)?);
                Some(PlacedNode { node, position })
            })
            .collect()
    }

    /// Edges whose endpoints are both visible, in surface coordinates.
    pub fn placed_edges(&self) -> Vec<PlacedEdge<'_>> {
        let Some(instance) = self.instance.as_ref() else {
            return Vec::new();
        };
        let visible: HashSet<&str> = instance
            .adapted
            .visible_nodes()
            .map(|n| n.id.as_str())
            .collect();

        instance
            .adapted
            .edges
            .iter()
            .filter(|e| visible.contains(e.from.as_str()) && visible.contains(e.to.as_str()))
            .filter_map(|edge| {
                let from = instance.viewport.to_surface(instance.layout.position(&edge.from)?);
                let to = instance.viewport.to_surface(instance.layout.position(&edge.to)?);
                Some(PlacedEdge { edge, from, to })
            })
            .collect()
    }
}

impl Drop for NetworkView {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphEdge;

    fn triangle() -> GraphData {
        GraphData::new(
            vec![
                GraphNode::new("a", "A"),
                GraphNode::new("b", "B"),
                GraphNode::new("c", "C"),
            ],
            vec![GraphEdge::new("a", "b", "r"), GraphEdge::new("b", "c", "r")],
        )
    }

    #[test]
    fn test_viewport_round_trip() {
        let viewport = Viewport {
            center: Vec2::new(10.0, -5.0),
            scale: 0.5,
            width: 100.0,
            height: 40.0,
        };
        let world = Vec2::new(42.0, 7.0);
        let back = viewport.to_world(viewport.to_surface(world));
        assert!((back.x - world.x).abs() < 1e-9);
        assert!((back.y - world.y).abs() < 1e-9);
        assert_eq!(viewport.to_surface(viewport.center), Vec2::new(50.0, 20.0));
    }

    #[test]
    fn test_empty_data_stays_uninitialized() {
        let mut view = NetworkView::new(PhysicsConfig::default(), 100.0, 40.0);
        view.mount(GraphData::default(), AdapterOptions::default()).unwrap();
        assert_eq!(view.state(), ViewState::Uninitialized);
        assert!(!view.tick());
    }

    #[test]
    fn test_unchanged_update_keeps_instance() {
        let mut view = NetworkView::new(PhysicsConfig::default(), 100.0, 40.0);
        view.mount(triangle(), AdapterOptions::default()).unwrap();
        while !view.tick() {}
        assert_eq!(view.state(), ViewState::Ready);

        view.update(triangle(), AdapterOptions::default()).unwrap();
        assert_eq!(view.state(), ViewState::Ready);
        assert_eq!(view.fit_count(), 1);
    }

    #[test]
    fn test_toggle_rebuilds_and_refits() {
        let mut view = NetworkView::new(PhysicsConfig::default(), 100.0, 40.0);
        view.mount(triangle(), AdapterOptions::default()).unwrap();
        while !view.tick() {}

        view.set_options(AdapterOptions {
            show_labels: false,
            ..AdapterOptions::default()
        })
        .unwrap();
        assert_eq!(view.state(), ViewState::Stabilizing);
        while !view.tick() {}
        assert_eq!(view.fit_count(), 2);
        assert_eq!(view.placed_nodes()[0].node.label, "");
    }

    #[test]
    fn test_non_physics_fits_on_first_draw() {
        let physics = PhysicsConfig {
            enabled: false,
            ..PhysicsConfig::default()
        };
        let mut view = NetworkView::new(physics, 100.0, 40.0);
        view.mount(triangle(), AdapterOptions::default()).unwrap();
        assert!(!view.tick());
        assert_eq!(view.state(), ViewState::Stabilizing);

        view.mark_drawn();
        view.mark_drawn();
        assert_eq!(view.state(), ViewState::Ready);
        assert_eq!(view.fit_count(), 1);
    }

    #[test]
    fn test_fitted_nodes_inside_surface() {
        let mut view = NetworkView::new(PhysicsConfig::default(), 100.0, 40.0);
        view.mount(triangle(), AdapterOptions::default()).unwrap();
        while !view.tick() {}

        for placed in view.placed_nodes() {
            assert!(placed.position.x >= 0.0 && placed.position.x <= 100.0);
            assert!(placed.position.y >= 0.0 && placed.position.y <= 40.0);
        }
        assert_eq!(view.placed_edges().len(), 2);
    }

    #[test]
    fn test_non_physics_waits_for_surface() {
        let physics = PhysicsConfig {
            enabled: false,
            ..PhysicsConfig::default()
        };
        let mut view = NetworkView::new(physics, 0.0, 0.0);
        view.mount(triangle(), AdapterOptions::default()).unwrap();
        view.mark_drawn();
        assert_eq!(view.state(), ViewState::Stabilizing);

        view.resize(100.0, 40.0);
        view.mark_drawn();
        assert_eq!(view.state(), ViewState::Ready);
        assert_eq!(view.fit_count(), 1);
    }

    #[test]
    fn test_destroy_is_terminal() {
        let mut view = NetworkView::new(PhysicsConfig::default(), 100.0, 40.0);
        view.mount(triangle(), AdapterOptions::default()).unwrap();
        view.destroy();
        assert_eq!(view.state(), ViewState::Destroyed);

        view.update(triangle(), AdapterOptions::default()).unwrap();
        assert_eq!(view.state(), ViewState::Destroyed);
        assert_eq!(view.node_count(), 0);
        assert!(!view.click(50.0, 20.0, |_| panic!("no instance")));
    }
}
