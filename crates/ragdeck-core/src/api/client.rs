use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::models::RawGraph;
use super::{
    parse_answer_body, ApiError, ApiResponse, ChunkDecoder, Document, HealthStatus, QueryRequest,
    RagApi, StreamChunk, StreamFraming, UploadKind,
};
use crate::config::ApiConfig;
use crate::graph::GraphData;

/// Longest payload excerpt written to the log on failure.
const LOG_PAYLOAD_LIMIT: usize = 512;

/// reqwest-backed client for the RAG backend.
pub struct HttpClient {
    base_url: String,
    framing: StreamFraming,
    client: Client,
}

impl HttpClient {
    /// Creates a client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ApiError::InvalidUrl(base_url));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            framing: StreamFraming::default(),
            client,
        })
    }

    /// Creates a client from the `[api]` config section.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Ok(Self::new(&config.base_url, config.timeout())?.with_framing(config.stream_framing))
    }

    /// Sets the framing used to decode streamed answers.
    pub fn with_framing(mut self, framing: StreamFraming) -> Self {
        self.framing = framing;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .inspect_err(|e| log_transport_failure(path, Method::POST, e))?;

        read_json(path, Method::POST, response).await
    }

    async fn stream_query(
        &self,
        request: &QueryRequest,
        chunks: Option<&mpsc::UnboundedSender<StreamChunk>>,
    ) -> Result<String, ApiError> {
        let response = self.client.post(self.url("/query")).json(request).send().await?;
        let response = ensure_success("/query", Method::POST, response).await?;

        let mut decoder = ChunkDecoder::new(self.framing);
        let mut answer = String::new();
        let mut body = response.bytes_stream();

        while let Some(frame) = body.next().await {
            let frame = frame?;
            for text in decoder.push(&frame)? {
                forward_chunk(chunks, &mut answer, text);
            }
        }
        for text in decoder.finish()? {
            forward_chunk(chunks, &mut answer, text);
        }

        Ok(answer)
    }

    async fn single_query(&self, request: &QueryRequest) -> Result<String, ApiError> {
        let response = self.client.post(self.url("/query")).json(request).send().await?;
        let response = ensure_success("/query", Method::POST, response).await?;
        let body = response.text().await?;
        parse_answer_body(&body)
    }

    async fn fetch_health(&self) -> Result<HealthStatus, ApiError> {
        let response = self.client.get(self.url("/health")).send().await?;
        read_json("/health", Method::GET, response).await
    }

    async fn build_upload_form(files: &[PathBuf]) -> Result<Form, ApiError> {
        // The backend reads a lone file from `file` and several from `files`.
        let field = if files.len() == 1 { "file" } else { "files" };
        let mut form = Form::new();

        for path in files {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| ApiError::io(path, e))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload.txt".to_string());
            let mime = if file_name.to_ascii_lowercase().ends_with(".csv") {
                "text/csv"
            } else {
                "text/plain"
            };
            let part = Part::bytes(bytes).file_name(file_name).mime_str(mime)?;
            form = form.part(field, part);
        }

        Ok(form)
    }
}

#[async_trait]
impl RagApi for HttpClient {
    async fn check_health(&self) -> HealthStatus {
        match self.fetch_health().await {
            Ok(health) => health,
            Err(e) => {
                tracing::warn!(endpoint = "/health", method = "GET", error = %e, "health check failed");
                HealthStatus::unhealthy()
            }
        }
    }

    async fn list_documents(&self) -> Result<ApiResponse<Vec<Document>>, ApiError> {
        let response: ApiResponse<Vec<Document>> =
            self.post_json("/get-document", &json!({})).await?;
        ensure_not_error("/get-document", response)
    }

    async fn upload_files(
        &self,
        files: &[PathBuf],
        kind: UploadKind,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let endpoint = kind.endpoint();
        let form = Self::build_upload_form(files).await?;

        tracing::info!(endpoint, files = files.len(), "uploading documents");

        let response = self
            .client
            .post(self.url(endpoint))
            .multipart(form)
            .send()
            .await
            .inspect_err(|e| log_transport_failure(endpoint, Method::POST, e))?;

        let response: ApiResponse<Value> = read_json(endpoint, Method::POST, response).await?;
        ensure_not_error(endpoint, response)
    }

    async fn fetch_graph(&self) -> Result<GraphData, ApiError> {
        let response = self
            .client
            .get(self.url("/get-graph"))
            .send()
            .await
            .inspect_err(|e| log_transport_failure("/get-graph", Method::GET, e))?;

        let raw: RawGraph = read_json("/get-graph", Method::GET, response).await?;
        let graph = raw.normalize();

        tracing::debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "fetched graph"
        );
        Ok(graph)
    }

    async fn submit_query(
        &self,
        request: &QueryRequest,
        chunks: Option<mpsc::UnboundedSender<StreamChunk>>,
    ) -> ApiResponse<String> {
        let result = if request.stream {
            self.stream_query(request, chunks.as_ref()).await
        } else {
            self.single_query(request).await.inspect(|answer| {
                if let Some(tx) = &chunks {
                    let _ = tx.send(StreamChunk::text(answer.clone()));
                }
            })
        };

        if let Some(tx) = &chunks {
            let _ = tx.send(StreamChunk::done());
        }

        match result {
            Ok(answer) => ApiResponse::success(answer),
            Err(e) => {
                tracing::warn!(
                    endpoint = "/query",
                    method = "POST",
                    mode = %request.mode,
                    stream = request.stream,
                    error = %e,
                    "query failed"
                );
                ApiResponse::error(e.to_string())
            }
        }
    }

    async fn delete_document(&self, doc_id: &str) -> Result<ApiResponse<Value>, ApiError> {
        let response: ApiResponse<Value> = self
            .post_json("/delete_by_doc", &json!({ "doc_id": doc_id }))
            .await?;
        ensure_not_error("/delete_by_doc", response)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn forward_chunk(
    chunks: Option<&mpsc::UnboundedSender<StreamChunk>>,
    answer: &mut String,
    text: String,
) {
    answer.push_str(&text);
    if let Some(tx) = chunks {
        let _ = tx.send(StreamChunk::text(text));
    }
}

/// Turn a non-2xx response into `ApiError::Status`, logging the body.
async fn ensure_success(
    endpoint: &str,
    method: Method,
    response: Response,
) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!(
        endpoint,
        method = %method,
        status = status.as_u16(),
        payload = excerpt(&body),
        "request returned error status"
    );
    Err(ApiError::Status {
        status: status.as_u16(),
        message: body,
    })
}

async fn read_json<T: DeserializeOwned>(
    endpoint: &str,
    method: Method,
    response: Response,
) -> Result<T, ApiError> {
    let response = ensure_success(endpoint, method.clone(), response).await?;
    let status = response.status().as_u16();
    let body = response.text().await?;

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(
            endpoint,
            method = %method,
            status,
            payload = excerpt(&body),
            error = %e,
            "failed to decode response"
        );
        ApiError::Parse(e.to_string())
    })
}

fn ensure_not_error<T>(endpoint: &str, response: ApiResponse<T>) -> Result<ApiResponse<T>, ApiError> {
    if response.is_error() {
        let message = response.message_or_default().to_string();
        tracing::error!(endpoint, message = %message, "backend reported failure");
        return Err(ApiError::Backend(message));
    }
    Ok(response)
}

fn log_transport_failure(endpoint: &str, method: Method, error: &reqwest::Error) {
    tracing::error!(endpoint, method = %method, error = %error, "request failed");
}

fn excerpt(body: &str) -> &str {
    if body.len() <= LOG_PAYLOAD_LIMIT {
        return body;
    }
    let mut end = LOG_PAYLOAD_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpClient::new("http://localhost:8000", Duration::from_secs(300)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.framing, StreamFraming::Raw);
    }

    #[test]
    fn test_url_trailing_slash_removed() {
        let client = HttpClient::new("http://rag.example.com/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.url("/health"), "http://rag.example.com/health");
    }

    #[test]
    fn test_rejects_url_without_scheme() {
        let result = HttpClient::new("localhost:8000", Duration::from_secs(5));
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_from_config_uses_framing() {
        let config = ApiConfig {
            stream_framing: StreamFraming::Ndjson,
            ..ApiConfig::default()
        };
        let client = HttpClient::from_config(&config).unwrap();
        assert_eq!(client.framing, StreamFraming::Ndjson);
    }

    #[test]
    fn test_excerpt_respects_char_boundary() {
        let body = "é".repeat(LOG_PAYLOAD_LIMIT);
        let cut = excerpt(&body);
        assert!(cut.len() <= LOG_PAYLOAD_LIMIT);
        assert!(body.starts_with(cut));
    }
}
