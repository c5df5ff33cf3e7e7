//! HTTP route handlers for the graph server.
//!
//! Handlers are kept thin: fetch from the backend, adapt, serialize.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};

use ragdeck_core::graph::{adapt, AdapterOptions};

use super::models::{ErrorResponse, GraphParams, GraphResponse, HealthResponse, NetworkOptions};
use super::templates;
use super::AppState;

// =============================================================================
// Errors
// =============================================================================

/// A backend failure, reported to the page as 502 with a JSON message.
#[derive(Debug)]
pub struct ApiFailure(String);

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse { error: self.0 });
        (StatusCode::BAD_GATEWAY, body).into_response()
    }
}

// =============================================================================
// Page Handlers
// =============================================================================

/// GET `/` - Graph page.
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(templates::render_graph_page(
        &state.backend_url,
        state.graph.panel_height,
    ))
}

// =============================================================================
// API Handlers
// =============================================================================

/// GET `/api/graph` - Adapted graph plus vis-network options.
///
/// Query parameters:
/// - `labels`: show labels (default from config)
/// - `hide_isolated`: hide nodes without edges (default from config)
pub async fn api_graph(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GraphParams>,
) -> Result<Json<GraphResponse>, ApiFailure> {
    let defaults = state.graph.adapter_options();
    let options = AdapterOptions {
        show_labels: params.labels.unwrap_or(defaults.show_labels),
        hide_isolated: params.hide_isolated.unwrap_or(defaults.hide_isolated),
        ..defaults
    };

    let data = state.api.fetch_graph().await.map_err(|e| {
        tracing::warn!(error = %e, "graph fetch failed");
        ApiFailure(e.to_string())
    })?;

    let graph = adapt(&data, &options);
    Ok(Json(GraphResponse {
        hidden: graph.hidden_count(),
        graph,
        options: NetworkOptions::from(&state.graph.physics),
        height: state.graph.panel_height,
    }))
}

/// GET `/api/health` - Backend liveness.
pub async fn api_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let health = state.api.check_health().await;
    Json(HealthResponse {
        healthy: health.is_healthy(),
        status: health.status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use async_trait::async_trait;
    use ragdeck_core::api::{
        ApiError, ApiResponse, Document, HealthStatus, QueryRequest, RagApi, StreamChunk,
        UploadKind,
    };
    use ragdeck_core::config::GraphConfig;
    use ragdeck_core::graph::{GraphData, GraphEdge, GraphNode};
    use serde_json::Value;
    use tokio::sync::mpsc;

    /// Serves one fixed graph, or fails when there is none.
    struct FixedGraph(Option<GraphData>);

    #[async_trait]
    impl RagApi for FixedGraph {
        async fn check_health(&self) -> HealthStatus {
            match self.0 {
                Some(_) => HealthStatus {
                    status: "healthy".into(),
                },
                None => HealthStatus::unhealthy(),
            }
        }
        async fn list_documents(&self) -> Result<ApiResponse<Vec<Document>>, ApiError> {
            Ok(ApiResponse::success(Vec::new()))
        }
        async fn upload_files(
            &self,
            _files: &[PathBuf],
            _kind: UploadKind,
        ) -> Result<ApiResponse<Value>, ApiError> {
            Ok(ApiResponse::success(Value::Null))
        }
        async fn fetch_graph(&self) -> Result<GraphData, ApiError> {
            self.0
                .clone()
                .ok_or_else(|| ApiError::Network("connection refused".into()))
        }
        async fn submit_query(
            &self,
            _request: &QueryRequest,
            _chunks: Option<mpsc::UnboundedSender<StreamChunk>>,
        ) -> ApiResponse<String> {
            ApiResponse::success(String::new())
        }
        async fn delete_document(&self, _doc_id: &str) -> Result<ApiResponse<Value>, ApiError> {
            Ok(ApiResponse::success(Value::Null))
        }
    }

    fn state(graph: Option<GraphData>) -> State<Arc<AppState>> {
        State(Arc::new(AppState {
            api: Arc::new(FixedGraph(graph)),
            graph: GraphConfig::default(),
            backend_url: "http://localhost:8000".into(),
        }))
    }

    fn sample() -> GraphData {
        GraphData::new(
            vec![
                GraphNode::new("a", "Alice"),
                GraphNode::new("b", "Bob"),
                GraphNode::new("c", "Carol"),
            ],
            vec![
                GraphEdge::new("a", "b", "knows"),
                GraphEdge::new("a", "ghost", "haunts"),
            ],
        )
    }

    #[tokio::test]
    async fn test_graph_uses_config_defaults() {
        let Json(response) = api_graph(state(Some(sample())), Query(GraphParams::default()))
            .await
            .unwrap();

        assert_eq!(response.graph.nodes.len(), 3);
        assert_eq!(response.graph.edges.len(), 1);
        assert_eq!(response.graph.dropped_edges, 1);
        assert_eq!(response.hidden, 0);
        assert_eq!(response.height, 600);
        assert_eq!(response.graph.nodes[0].label, "Alice");
    }

    #[tokio::test]
    async fn test_graph_params_override_toggles() {
        let params = GraphParams {
            labels: Some(false),
            hide_isolated: Some(true),
        };
        let Json(response) = api_graph(state(Some(sample())), Query(params)).await.unwrap();

        assert_eq!(response.hidden, 1);
        assert!(response.graph.nodes.iter().all(|n| n.label.is_empty()));
    }

    #[tokio::test]
    async fn test_graph_options_serialize_for_vis() {
        let Json(response) = api_graph(state(Some(sample())), Query(GraphParams::default()))
            .await
            .unwrap();
        let json = serde_json::to_value(&response).unwrap();

        let physics = &json["options"]["physics"];
        assert_eq!(physics["solver"], "barnesHut");
        assert_eq!(physics["barnesHut"]["gravitationalConstant"], -8000.0);
        assert_eq!(physics["stabilization"]["fit"], false);
        assert!(json["nodes"].is_array());
        assert_eq!(json["dropped_edges"], 1);
    }

    #[tokio::test]
    async fn test_backend_failure_is_bad_gateway() {
        let failure = api_graph(state(None), Query(GraphParams::default()))
            .await
            .unwrap_err();
        assert!(failure.0.contains("connection refused"));
        assert_eq!(failure.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_health() {
        let Json(up) = api_health(state(Some(GraphData::default()))).await;
        assert!(up.healthy);

        let Json(down) = api_health(state(None)).await;
        assert!(!down.healthy);
        assert_eq!(down.status, "unhealthy");
    }

    #[tokio::test]
    async fn test_index_embeds_backend_url() {
        let Html(page) = index(state(None)).await;
        assert!(page.contains("http://localhost:8000"));
        assert!(page.contains("vis-network"));
        assert!(!page.contains("{{"));
    }
}
