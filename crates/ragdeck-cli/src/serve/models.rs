//! API response models for the graph server.
//!
//! `/api/graph` carries the adapted node and edge sets unchanged, so the page
//! can hand them straight to vis-network's DataSets, plus the network options
//! derived from the physics configuration.

use serde::{Deserialize, Serialize};

use ragdeck_core::config::PhysicsConfig;
use ragdeck_core::AdaptedGraph;

// =============================================================================
// Graph
// =============================================================================

/// Query parameters of `/api/graph`. Missing values fall back to the config.
#[derive(Debug, Default, Deserialize)]
pub struct GraphParams {
    pub labels: Option<bool>,
    pub hide_isolated: Option<bool>,
}

/// Response of `/api/graph`.
#[derive(Debug, Serialize)]
pub struct GraphResponse {
    #[serde(flatten)]
    pub graph: AdaptedGraph,
    /// Nodes flagged hidden by the isolation filter.
    pub hidden: usize,
    pub options: NetworkOptions,
    /// Panel height in pixels.
    pub height: u32,
}

/// vis-network `options` object.
#[derive(Debug, Serialize)]
pub struct NetworkOptions {
    pub physics: PhysicsOptions,
    pub interaction: InteractionOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicsOptions {
    pub enabled: bool,
    pub solver: &'static str,
    pub barnes_hut: BarnesHut,
    pub timestep: f64,
    pub min_velocity: f64,
    pub stabilization: Stabilization,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarnesHut {
    pub gravitational_constant: f64,
    pub spring_length: f64,
    pub spring_constant: f64,
    pub damping: f64,
}

/// The page fits once itself when stabilization ends.
#[derive(Debug, Serialize)]
pub struct Stabilization {
    pub enabled: bool,
    pub iterations: u32,
    pub fit: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionOptions {
    pub hover: bool,
    pub tooltip_delay: u32,
}

impl From<&PhysicsConfig> for NetworkOptions {
    fn from(physics: &PhysicsConfig) -> Self {
        Self {
            physics: PhysicsOptions {
                enabled: physics.enabled,
                solver: "barnesHut",
                barnes_hut: BarnesHut {
                    gravitational_constant: -physics.repulsion,
                    spring_length: physics.spring_length,
                    spring_constant: physics.spring_strength,
                    // vis damping removes velocity; ours keeps it.
                    damping: 1.0 - physics.damping,
                },
                timestep: physics.time_step,
                min_velocity: physics.min_velocity,
                stabilization: Stabilization {
                    enabled: physics.enabled,
                    iterations: physics.max_iterations,
                    fit: false,
                },
            },
            interaction: InteractionOptions {
                hover: true,
                tooltip_delay: 200,
            },
        }
    }
}

// =============================================================================
// Health / Errors
// =============================================================================

/// Response of `/api/health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub healthy: bool,
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
