//! Configuration management for ragdeck.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `ragdeck.toml` file
//! 3. User config `~/.config/ragdeck/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

mod defaults;

pub use defaults::*;

use crate::api::{QueryMode, StreamFraming};
use crate::graph::{AdapterOptions, Theme};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend connection settings.
    pub api: ApiConfig,

    /// Query defaults.
    pub query: QueryConfig,

    /// Graph rendering settings.
    pub graph: GraphConfig,

    /// Upload validation rules.
    pub upload: UploadConfig,

    /// Terminal UI settings.
    pub ui: UiConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./ragdeck.toml` (project local)
    /// 2. `~/.config/ragdeck/config.toml` (user config)
    /// 3. Falls back to defaults
    ///
    /// Environment overrides are applied in every case.
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new(LOCAL_CONFIG_FILE).exists() {
            return Self::from_file(LOCAL_CONFIG_FILE);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(USER_CONFIG_DIR).join(USER_CONFIG_FILE);
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        config.validate()?;

        tracing::debug!(path = %path.as_ref().display(), "loaded configuration");
        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                self.api.base_url = url;
            }
        }
        if let Ok(secs) = std::env::var(ENV_TIMEOUT_SECS) {
            if let Ok(n) = secs.parse() {
                self.api.timeout_secs = n;
            }
        }
        if let Ok(framing) = std::env::var(ENV_STREAM_FRAMING) {
            if let Ok(f) = framing.parse() {
                self.api.stream_framing = f;
            }
        }
        if let Ok(mode) = std::env::var(ENV_QUERY_MODE) {
            if let Ok(m) = mode.parse() {
                self.query.mode = m;
            }
        }
    }

    /// Check values that would make the client unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url must not be empty".into()));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid("api.timeout_secs must be positive".into()));
        }
        if self.upload.allowed_extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "upload.allowed_extensions must list at least one extension".into(),
            ));
        }
        Ok(())
    }

    /// Render this configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Backend connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the RAG service.
    pub base_url: String,

    /// Timeout for every request, in seconds.
    pub timeout_secs: u64,

    /// How streamed answers are cut into chunks.
    pub stream_framing: StreamFraming,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            stream_framing: StreamFraming::default(),
        }
    }
}

impl ApiConfig {
    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Query defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Retrieval mode sent with each query.
    pub mode: QueryMode,

    /// Whether answers are streamed.
    pub stream: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            mode: QueryMode::default(),
            stream: DEFAULT_STREAM,
        }
    }
}

/// Graph rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Show node and edge labels.
    pub show_labels: bool,

    /// Hide nodes without any retained edge.
    pub hide_isolated: bool,

    /// Color theme.
    pub theme: Theme,

    /// Fixed height of the browser graph panel, in pixels.
    pub panel_height: u32,

    /// Physics solver parameters.
    pub physics: PhysicsConfig,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            show_labels: true,
            hide_isolated: false,
            theme: Theme::default(),
            panel_height: DEFAULT_PANEL_HEIGHT,
            physics: PhysicsConfig::default(),
        }
    }
}

impl GraphConfig {
    /// Adapter options derived from the display toggles.
    pub fn adapter_options(&self) -> AdapterOptions {
        AdapterOptions {
            show_labels: self.show_labels,
            hide_isolated: self.hide_isolated,
            theme: self.theme,
        }
    }
}

/// Force-directed layout parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Run the simulation at all. When off, nodes keep their initial placement.
    pub enabled: bool,
    pub repulsion: f64,
    pub spring_length: f64,
    pub spring_strength: f64,
    pub damping: f64,
    pub time_step: f64,
    pub min_velocity: f64,
    pub max_iterations: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            repulsion: DEFAULT_REPULSION,
            spring_length: DEFAULT_SPRING_LENGTH,
            spring_strength: DEFAULT_SPRING_STRENGTH,
            damping: DEFAULT_DAMPING,
            time_step: DEFAULT_TIME_STEP,
            min_velocity: DEFAULT_MIN_VELOCITY,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Upload validation rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Accepted extensions (without leading dot, compared case-insensitively).
    pub allowed_extensions: Vec<String>,

    /// Maximum files per upload.
    pub max_files: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: DEFAULT_UPLOAD_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_files: DEFAULT_MAX_UPLOAD_FILES,
        }
    }
}

/// Terminal UI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub tick_rate_ms: u64,
    pub notice_secs: u64,
    pub health_interval_secs: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: DEFAULT_TICK_RATE_MS,
            notice_secs: DEFAULT_NOTICE_SECS,
            health_interval_secs: DEFAULT_HEALTH_INTERVAL_SECS,
        }
    }
}
