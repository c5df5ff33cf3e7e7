//! Widgets drawn by the TUI, one module per screen region.

pub mod backdrop;
pub mod chat;
pub mod documents;
pub mod graph;
pub mod input;
pub mod status;
pub mod tabs;
