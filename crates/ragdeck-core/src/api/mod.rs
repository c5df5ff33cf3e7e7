mod client;
mod error;
mod models;
mod stream;

pub use client::HttpClient;
pub use error::ApiError;
pub use models::{
    parse_answer_body, ApiResponse, Document, HealthStatus, QueryMode, QueryRequest, UploadKind,
};
pub use stream::{ChunkDecoder, StreamFraming};

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::graph::GraphData;

/// A chunk of a streamed answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk {
    /// The text content of this chunk.
    pub text: String,
    /// Whether this is the final chunk.
    pub is_final: bool,
}

impl StreamChunk {
    /// Create a new text chunk.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    /// Create a final (end of stream) chunk.
    pub fn done() -> Self {
        Self {
            text: String::new(),
            is_final: true,
        }
    }
}

/// Operations offered by the RAG backend.
///
/// [`HttpClient`] is the real implementation; the trait exists so the query
/// controller and the UI can run against a scripted backend in tests.
///
/// # Example
///
/// ```ignore
/// use ragdeck_core::api::{HttpClient, QueryMode, QueryRequest, RagApi};
///
/// let api = HttpClient::new("http://localhost:8000", Duration::from_secs(300))?;
/// let answer = api
///     .submit_query(&QueryRequest::new("Who is Alice?", QueryMode::Hybrid, false), None)
///     .await;
/// ```
#[async_trait]
pub trait RagApi: Send + Sync {
    /// Liveness check. Never fails: an unreachable backend reads as `unhealthy`.
    async fn check_health(&self) -> HealthStatus;

    /// List the documents ingested by the backend.
    async fn list_documents(&self) -> Result<ApiResponse<Vec<Document>>, ApiError>;

    /// Upload files to the initial or incremental ingest endpoint.
    ///
    /// Performs no validation; see [`crate::upload::validate_upload`].
    async fn upload_files(
        &self,
        files: &[PathBuf],
        kind: UploadKind,
    ) -> Result<ApiResponse<Value>, ApiError>;

    /// Fetch the whole knowledge graph.
    async fn fetch_graph(&self) -> Result<GraphData, ApiError>;

    /// Ask a question.
    ///
    /// Text chunks go through `chunks` in arrival order, followed by
    /// [`StreamChunk::done`]. A non-streamed request sends exactly one text
    /// chunk. Failures come back as `status: "error"` instead of `Err`.
    async fn submit_query(
        &self,
        request: &QueryRequest,
        chunks: Option<mpsc::UnboundedSender<StreamChunk>>,
    ) -> ApiResponse<String>;

    /// Remove a document by its `doc_id`.
    async fn delete_document(&self, doc_id: &str) -> Result<ApiResponse<Value>, ApiError>;
}

/// Shared handles forward to the inner client.
#[async_trait]
impl<A: RagApi + ?Sized> RagApi for Arc<A> {
    async fn check_health(&self) -> HealthStatus {
        (**self).check_health().await
    }

    async fn list_documents(&self) -> Result<ApiResponse<Vec<Document>>, ApiError> {
        (**self).list_documents().await
    }

    async fn upload_files(
        &self,
        files: &[PathBuf],
        kind: UploadKind,
    ) -> Result<ApiResponse<Value>, ApiError> {
        (**self).upload_files(files, kind).await
    }

    async fn fetch_graph(&self) -> Result<GraphData, ApiError> {
        (**self).fetch_graph().await
    }

    async fn submit_query(
        &self,
        request: &QueryRequest,
        chunks: Option<mpsc::UnboundedSender<StreamChunk>>,
    ) -> ApiResponse<String> {
        (**self).submit_query(request, chunks).await
    }

    async fn delete_document(&self, doc_id: &str) -> Result<ApiResponse<Value>, ApiError> {
        (**self).delete_document(doc_id).await
    }
}
