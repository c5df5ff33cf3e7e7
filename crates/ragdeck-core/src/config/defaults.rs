//! Default values for ragdeck configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// API Defaults
// ============================================================================

/// Base URL of the RAG backend used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Request timeout in seconds, applied to every call including uploads.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variable selecting the API base URL.
pub const ENV_API_URL: &str = "RAGDECK_API_URL";

/// Environment variable overriding the request timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "RAGDECK_TIMEOUT_SECS";

/// Environment variable selecting the stream framing (`raw` or `ndjson`).
pub const ENV_STREAM_FRAMING: &str = "RAGDECK_STREAM_FRAMING";

// ============================================================================
// Query Defaults
// ============================================================================

/// Environment variable selecting the retrieval mode.
pub const ENV_QUERY_MODE: &str = "RAGDECK_QUERY_MODE";

/// Whether queries stream by default.
pub const DEFAULT_STREAM: bool = true;

// ============================================================================
// Graph Defaults
// ============================================================================

/// Label font size when labels are shown.
pub const LABEL_FONT_SIZE: u32 = 14;

/// Height of the browser graph panel in pixels.
pub const DEFAULT_PANEL_HEIGHT: u32 = 600;

/// Repulsive force constant between every pair of nodes.
pub const DEFAULT_REPULSION: f64 = 8000.0;

/// Rest length of the spring along an edge.
pub const DEFAULT_SPRING_LENGTH: f64 = 120.0;

/// Spring stiffness along edges.
pub const DEFAULT_SPRING_STRENGTH: f64 = 0.04;

/// Velocity damping per step (0.0 to 1.0).
pub const DEFAULT_DAMPING: f64 = 0.85;

/// Simulation time step.
pub const DEFAULT_TIME_STEP: f64 = 0.5;

/// Largest node velocity at which the layout counts as stabilized.
pub const DEFAULT_MIN_VELOCITY: f64 = 0.5;

/// Hard cap on simulation steps before stabilization is forced.
pub const DEFAULT_MAX_ITERATIONS: u32 = 1000;

// ============================================================================
// Upload Defaults
// ============================================================================

/// File extensions accepted for upload (without leading dot).
pub const DEFAULT_UPLOAD_EXTENSIONS: &[&str] = &["txt", "csv"];

/// Maximum number of files in one upload.
pub const DEFAULT_MAX_UPLOAD_FILES: usize = 10;

// ============================================================================
// UI Defaults
// ============================================================================

/// TUI tick interval in milliseconds.
pub const DEFAULT_TICK_RATE_MS: u64 = 100;

/// How long a transient notification stays visible.
pub const DEFAULT_NOTICE_SECS: u64 = 4;

/// Interval between health checks in the TUI.
pub const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 30;

// ============================================================================
// Config File Locations
// ============================================================================

/// Project-local config file name.
pub const LOCAL_CONFIG_FILE: &str = "ragdeck.toml";

/// Directory name under the user config dir.
pub const USER_CONFIG_DIR: &str = "ragdeck";

/// File name inside the user config dir.
pub const USER_CONFIG_FILE: &str = "config.toml";
