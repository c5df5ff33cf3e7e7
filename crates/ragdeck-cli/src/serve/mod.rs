//! Local web server for the knowledge graph.
//!
//! Serves a single page that renders the backend graph with vis-network,
//! plus a small JSON API the page polls. Graph data is fetched from the RAG
//! backend on every request and adapted exactly as the TUI adapts it.
//!
//! # Module Structure
//!
//! - `handlers` - HTTP route handlers
//! - `models` - API response types (DTOs)
//! - `templates` - HTML/CSS/JS template rendering

mod handlers;
mod models;
mod templates;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use color_eyre::eyre::Result;
use tower_http::cors::{Any, CorsLayer};

use ragdeck_core::config::GraphConfig;
use ragdeck_core::RagApi;

/// Port used when none is given.
pub const DEFAULT_PORT: u16 = 3333;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state for the server.
pub struct AppState {
    /// Client for the RAG backend.
    pub api: Arc<dyn RagApi>,
    /// Display toggles, physics and panel height.
    pub graph: GraphConfig,
    /// Shown in the page header.
    pub backend_url: String,
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Configuration for the graph server.
pub struct ServeConfig {
    /// Port to listen on.
    pub port: u16,
    /// Whether to open the browser automatically.
    pub open_browser: bool,
    /// Base URL of the RAG backend.
    pub backend_url: String,
}

// =============================================================================
// Server Entry Point
// =============================================================================

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/graph", get(handlers::api_graph))
        .route("/api/health", get(handlers::api_health))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

/// Start the graph server and block until it stops.
pub async fn start_server(config: ServeConfig, api: Arc<dyn RagApi>, graph: GraphConfig) -> Result<()> {
    let state = Arc::new(AppState {
        api,
        graph,
        backend_url: config.backend_url,
    });
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let url = format!("http://localhost:{}", config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "graph server listening");

    println!("Knowledge graph: {}", url);
    println!("Press Ctrl+C to stop\n");

    if config.open_browser {
        if let Err(e) = open::that(&url) {
            eprintln!("Could not open browser: {}", e);
        }
    }

    axum::serve(listener, app).await?;

    Ok(())
}
