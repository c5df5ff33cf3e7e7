//! Knowledge graph model, styling, layout and view lifecycle.

mod adapter;
mod layout;
mod models;
mod view;

pub use adapter::{
    adapt, AdaptedGraph, AdapterOptions, EdgeColor, Font, NodeColor, Palette, Smooth, Theme,
    VisEdge, VisNode,
};
pub use layout::{Bounds, ForceLayout, Vec2};
pub use models::{GraphData, GraphEdge, GraphNode};
pub use view::{NetworkView, PlacedEdge, PlacedNode, ViewError, ViewState, Viewport};
