//! Request/response types exchanged with the RAG backend.
//!
//! The backend is loosely typed: graph payloads name the same concept
//! differently across endpoints (`source`, `start_id`, `from`). Everything is
//! normalized into the canonical [`GraphData`] shape right here so nothing
//! past the API boundary sees those differences.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ApiError;
use crate::graph::{GraphData, GraphEdge, GraphNode};

// =============================================================================
// Generic Envelope
// =============================================================================

/// Uniform `{status, data, message}` response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying `data`.
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data: Some(data),
            message: None,
        }
    }

    /// A failed response with no data.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            message: Some(message.into()),
        }
    }

    /// Whether the backend (or the client, on its behalf) reported failure.
    pub fn is_error(&self) -> bool {
        self.status.eq_ignore_ascii_case("error")
    }

    /// Message text, or an empty string.
    pub fn message_or_default(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    /// The value synthesized when the backend cannot be reached.
    pub fn unhealthy() -> Self {
        Self {
            status: "unhealthy".to_string(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(
            self.status.to_ascii_lowercase().as_str(),
            "healthy" | "ok" | "success"
        )
    }
}

// =============================================================================
// Queries
// =============================================================================

/// Retrieval strategy for a query. Semantics are owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    Local,
    Global,
    #[default]
    Hybrid,
}

impl QueryMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Global => "global",
            Self::Hybrid => "hybrid",
        }
    }

    /// Next mode in display order, wrapping around.
    pub fn next(self) -> Self {
        match self {
            Self::Local => Self::Global,
            Self::Global => Self::Hybrid,
            Self::Hybrid => Self::Local,
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "global" => Ok(Self::Global),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(format!("unknown query mode: {other}")),
        }
    }
}

/// Body of `POST /query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub mode: QueryMode,
    pub stream: bool,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>, mode: QueryMode, stream: bool) -> Self {
        Self {
            query: query.into(),
            mode,
            stream,
        }
    }
}

/// Parse a non-streamed answer body.
///
/// Accepts, in order: the `{status, data, message}` envelope, a `{response}`
/// object, a bare JSON string, and finally the raw text itself.
pub fn parse_answer_body(body: &str) -> Result<String, ApiError> {
    if let Ok(envelope) = serde_json::from_str::<ApiResponse<Value>>(body) {
        if envelope.is_error() {
            return Err(ApiError::Backend(
                envelope.message.unwrap_or_else(|| "query failed".to_string()),
            ));
        }
        return Ok(match envelope.data {
            Some(Value::String(text)) => text,
            Some(Value::Null) | None => envelope.message.unwrap_or_default(),
            Some(other) => other.to_string(),
        });
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("response") {
            Some(Value::String(text)) => Ok(text.clone()),
            _ => Ok(body.to_string()),
        },
        Ok(Value::String(text)) => Ok(text),
        _ => Ok(body.to_string()),
    }
}

// =============================================================================
// Documents
// =============================================================================

/// A document known to the backend. Read-only projection, never cached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub doc_id: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub content: String,
    pub content_summary: Option<String>,
    pub chunks_count: Option<u64>,
}

impl Document {
    /// Summary if present, otherwise the first line of the content.
    pub fn preview(&self) -> &str {
        match self.content_summary.as_deref() {
            Some(summary) if !summary.trim().is_empty() => summary,
            _ => self.content.lines().next().unwrap_or_default(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(&value).unwrap_or_default())
}

/// Which ingest endpoint an upload goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Initial,
    Incremental,
}

impl UploadKind {
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Initial => "/upload",
            Self::Incremental => "/incremental-upload",
        }
    }
}

// =============================================================================
// Graph Normalization
// =============================================================================

const EDGE_SOURCE_KEYS: &[&str] = &["from", "source", "start_id", "src_id"];
const EDGE_TARGET_KEYS: &[&str] = &["to", "target", "end_id", "tgt_id"];
const EDGE_LABEL_KEYS: &[&str] = &["label", "type", "relationship"];
const EDGE_LABEL_PROPERTY_KEYS: &[&str] = &["keywords", "description"];

/// Graph payload as the backend sends it.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawGraph {
    #[serde(default)]
    nodes: Vec<Map<String, Value>>,
    #[serde(default, alias = "links", alias = "relationships")]
    edges: Vec<Map<String, Value>>,
}

impl RawGraph {
    /// Normalize into the canonical graph shape.
    ///
    /// Nodes without an id and edges without both endpoints are skipped.
    pub(crate) fn normalize(self) -> GraphData {
        let nodes: Vec<GraphNode> = self
            .nodes
            .into_iter()
            .filter_map(|raw| {
                let node = normalize_node(raw);
                if node.is_none() {
                    tracing::debug!("skipping graph node without id");
                }
                node
            })
            .collect();

        let edges: Vec<GraphEdge> = self
            .edges
            .into_iter()
            .filter_map(|raw| {
                let edge = normalize_edge(raw);
                if edge.is_none() {
                    tracing::debug!("skipping graph edge without endpoints");
                }
                edge
            })
            .collect();

        GraphData { nodes, edges }
    }
}

fn normalize_node(mut raw: Map<String, Value>) -> Option<GraphNode> {
    let id = raw.get("id").and_then(value_to_string)?;
    let properties = take_properties(&mut raw);

    let label = raw
        .get("label")
        .and_then(value_to_string)
        .filter(|l| !l.is_empty())
        .or_else(|| match raw.get("labels") {
            Some(Value::Array(items)) if !items.is_empty() => Some(
                items
                    .iter()
                    .filter_map(value_to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => None,
        })
        .or_else(|| properties.get("entity_id").and_then(value_to_string))
        .unwrap_or_else(|| id.clone());

    Some(GraphNode {
        id,
        label,
        properties,
    })
}

fn normalize_edge(mut raw: Map<String, Value>) -> Option<GraphEdge> {
    let from = first_string(&raw, EDGE_SOURCE_KEYS)?;
    let to = first_string(&raw, EDGE_TARGET_KEYS)?;
    let properties = take_properties(&mut raw);

    let label = first_string(&raw, EDGE_LABEL_KEYS)
        .or_else(|| first_string(&properties, EDGE_LABEL_PROPERTY_KEYS))
        .unwrap_or_default();

    Some(GraphEdge {
        from,
        to,
        label,
        properties,
    })
}

fn take_properties(raw: &mut Map<String, Value>) -> Map<String, Value> {
    match raw.remove("properties") {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn first_string(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| map.get(*key).and_then(value_to_string))
        .find(|s| !s.is_empty())
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_mode_serializes_lowercase() {
        let req = QueryRequest::new("what?", QueryMode::Global, true);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, json!({"query": "what?", "mode": "global", "stream": true}));
    }

    #[test]
    fn test_query_mode_cycle() {
        assert_eq!(QueryMode::Local.next(), QueryMode::Global);
        assert_eq!(QueryMode::Global.next(), QueryMode::Hybrid);
        assert_eq!(QueryMode::Hybrid.next(), QueryMode::Local);
        assert_eq!("LOCAL".parse::<QueryMode>().unwrap(), QueryMode::Local);
        assert!("naive".parse::<QueryMode>().is_err());
    }

    #[test]
    fn test_parse_answer_envelope() {
        let body = r#"{"status":"success","data":"The answer.","message":"ok"}"#;
        assert_eq!(parse_answer_body(body).unwrap(), "The answer.");
    }

    #[test]
    fn test_parse_answer_error_envelope() {
        let body = r#"{"status":"error","data":null,"message":"no index"}"#;
        let err = parse_answer_body(body).unwrap_err();
        assert!(matches!(err, ApiError::Backend(m) if m == "no index"));
    }

    #[test]
    fn test_parse_answer_fallbacks() {
        assert_eq!(parse_answer_body(r#"{"response":"hi"}"#).unwrap(), "hi");
        assert_eq!(parse_answer_body(r#""quoted""#).unwrap(), "quoted");
        assert_eq!(parse_answer_body("plain text").unwrap(), "plain text");
    }

    #[test]
    fn test_normalize_edge_aliases() {
        let raw: RawGraph = serde_json::from_value(json!({
            "nodes": [
                {"id": "a", "labels": ["Person"], "properties": {"entity_id": "Alice"}},
                {"id": 2, "properties": {"entity_id": "Bob"}},
                {"label": "orphan without id"}
            ],
            "edges": [
                {"source": "a", "target": "2", "type": "KNOWS"},
                {"start_id": "2", "end_id": "a", "properties": {"keywords": "colleague"}},
                {"from": "a"}
            ]
        }))
        .unwrap();

        let graph = raw.normalize();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].label, "Person");
        assert_eq!(graph.nodes[1].id, "2");
        assert_eq!(graph.nodes[1].label, "Bob");

        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.edges[0].from, "a");
        assert_eq!(graph.edges[0].to, "2");
        assert_eq!(graph.edges[0].label, "KNOWS");
        assert_eq!(graph.edges[1].from, "2");
        assert_eq!(graph.edges[1].label, "colleague");
    }

    #[test]
    fn test_document_defaults() {
        let doc: Document = serde_json::from_value(json!({
            "id": 7,
            "doc_id": "doc-7",
            "status": "processed",
            "content": "first line\nsecond"
        }))
        .unwrap();
        assert_eq!(doc.id, "7");
        assert_eq!(doc.chunks_count, None);
        assert_eq!(doc.preview(), "first line");
    }

    #[test]
    fn test_upload_endpoints() {
        assert_eq!(UploadKind::Initial.endpoint(), "/upload");
        assert_eq!(UploadKind::Incremental.endpoint(), "/incremental-upload");
    }
}
