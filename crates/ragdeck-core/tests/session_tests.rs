use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ragdeck_core::api::{
    ApiError, ApiResponse, Document, HealthStatus, QueryMode, QueryRequest, RagApi, StreamChunk,
    UploadKind,
};
use ragdeck_core::graph::GraphData;
use ragdeck_core::session::{QueryController, SessionError, SessionEvent, Transcript};
use serde_json::Value;
use tokio::sync::{mpsc, Notify};

/// Backend double that answers every query with a fixed script.
#[derive(Default)]
struct ScriptedApi {
    chunks: Vec<&'static str>,
    failure: Option<&'static str>,
    gate: Option<Arc<Notify>>,
    queries: AtomicUsize,
}

impl ScriptedApi {
    fn answering(chunks: Vec<&'static str>) -> Self {
        Self {
            chunks,
            ..Self::default()
        }
    }
}

#[async_trait]
impl RagApi for ScriptedApi {
    async fn check_health(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy".into(),
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
        Ok(GraphData::default())
    }

    async fn submit_query(
        &self,
        request: &QueryRequest,
        chunks: Option<mpsc::UnboundedSender<StreamChunk>>,
    ) -> ApiResponse<String> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let tx = chunks.expect("controller always passes a chunk channel");
        let full: String = self.chunks.concat();
        if request.stream {
            for chunk in &self.chunks {
                tx.send(StreamChunk::text(*chunk)).unwrap();
                tokio::task::yield_now().await;
            }
        } else {
            tx.send(StreamChunk::text(full.clone())).unwrap();
        }
        tx.send(StreamChunk::done()).unwrap();

        match self.failure {
            Some(message) => ApiResponse::error(message),
            None => ApiResponse::success(full),
        }
    }

    async fn delete_document(&self, _doc_id: &str) -> Result<ApiResponse<Value>, ApiError> {
        Ok(ApiResponse::success(Value::Null))
    }
}

fn collect(mut rx: mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_streamed_chunks_assemble_in_order() {
    let controller = QueryController::new(ScriptedApi::answering(vec!["Hel", "lo wo", "rld"]));
    let (tx, rx) = mpsc::unbounded_channel();

    let exchange = controller
        .submit("Say hello", QueryMode::Hybrid, true, Some(tx))
        .await
        .unwrap();
    assert_eq!(exchange.response, "Hello world");

    let events = collect(rx);
    assert_eq!(events.len(), 4);

    let mut first_context_build = None;
    let mut partials = Vec::new();
    for event in &events[..3] {
        let SessionEvent::Chunk {
            response, metrics, ..
        } = event
        else {
            panic!("expected chunk event, got {event:?}");
        };
        partials.push(response.as_str());
        // Context-build time is fixed by the first chunk.
        assert!(metrics.context_build.is_some());
        assert!(metrics.total.is_none());
        match first_context_build {
            None => first_context_build = metrics.context_build,
            Some(first) => assert_eq!(metrics.context_build, Some(first)),
        }
    }
    assert_eq!(partials, vec!["Hel", "Hello wo", "Hello world"]);

    let SessionEvent::Completed(done) = &events[3] else {
        panic!("expected completion, got {:?}", events[3]);
    };
    assert_eq!(done.metrics.context_build, first_context_build);
    assert!(done.metrics.total.is_some());
    assert!(done.metrics.total >= done.metrics.context_build);
    assert_eq!(done, &exchange);
}

#[tokio::test]
async fn test_non_streaming_emits_one_chunk() {
    let controller = QueryController::new(ScriptedApi::answering(vec!["Hel", "lo wo", "rld"]));
    let (tx, rx) = mpsc::unbounded_channel();

    controller
        .submit("Say hello", QueryMode::Local, false, Some(tx))
        .await
        .unwrap();

    let chunks: Vec<String> = collect(rx)
        .into_iter()
        .filter_map(|e| match e {
            SessionEvent::Chunk { text, .. } => Some(text),
            _ => None,
        })
        .collect();
    assert_eq!(chunks, vec!["Hello world"]);
}

#[tokio::test]
async fn test_empty_query_makes_no_request() {
    let controller = QueryController::new(ScriptedApi::answering(vec!["unused"]));

    for query in ["", "   ", "\n\t"] {
        let result = controller.submit(query, QueryMode::Hybrid, true, None).await;
        assert_eq!(result, Err(SessionError::EmptyQuery));
    }
    assert_eq!(controller.api().queries.load(Ordering::SeqCst), 0);
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn test_failure_keeps_partial_response() {
    let controller = QueryController::new(ScriptedApi {
        chunks: vec!["Partial ", "answer"],
        failure: Some("stream interrupted"),
        ..ScriptedApi::default()
    });
    let (tx, rx) = mpsc::unbounded_channel();

    let result = controller
        .submit("q", QueryMode::Hybrid, true, Some(tx))
        .await;
    assert_eq!(
        result,
        Err(SessionError::Query("stream interrupted".to_string()))
    );

    let events = collect(rx);
    assert_eq!(
        events.last(),
        Some(&SessionEvent::Failed {
            message: "stream interrupted".to_string(),
            partial: "Partial answer".to_string(),
        })
    );
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn test_second_submission_rejected_while_busy() {
    let gate = Arc::new(Notify::new());
    let api = Arc::new(ScriptedApi {
        chunks: vec!["done"],
        gate: Some(Arc::clone(&gate)),
        ..ScriptedApi::default()
    });
    let controller = QueryController::new(Arc::clone(&api));

    let background = controller.clone();
    let first = tokio::spawn(async move {
        background
            .submit("first", QueryMode::Hybrid, true, None)
            .await
    });

    while api.queries.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    assert!(controller.is_busy());
    assert_eq!(
        controller.submit("second", QueryMode::Hybrid, true, None).await,
        Err(SessionError::Busy)
    );

    gate.notify_one();
    let exchange = first.await.unwrap().unwrap();
    assert_eq!(exchange.response, "done");
    assert!(!controller.is_busy());
    assert_eq!(api.queries.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_dropped_listener_does_not_abort_query() {
    let controller = QueryController::new(ScriptedApi::answering(vec!["a", "b"]));
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);

    let exchange = controller
        .submit("q", QueryMode::Global, true, Some(tx))
        .await
        .unwrap();
    assert_eq!(exchange.response, "ab");
}

#[tokio::test]
async fn test_events_drive_transcript() {
    let controller = QueryController::new(ScriptedApi::answering(vec!["line one\n", "\nline two"]));
    let mut transcript = Transcript::new();
    let id = transcript.begin("two lines please");

    let (tx, rx) = mpsc::unbounded_channel();
    controller
        .submit("two lines please", QueryMode::Hybrid, true, Some(tx))
        .await
        .unwrap();

    for event in collect(rx) {
        match event {
            SessionEvent::Chunk { response, .. } => {
                transcript.apply_response(id, response);
            }
            SessionEvent::Completed(exchange) => {
                transcript.finish(id, Some(exchange.metrics));
            }
            SessionEvent::Failed { message, .. } => {
                transcript.fail(id, message);
            }
        }
    }

    let message = transcript.get(id).unwrap();
    assert_eq!(message.response, "line one\n\nline two");
    assert_eq!(message.lines, vec!["line one", "line two"]);
    assert!(!message.streaming);
    assert!(message.metrics.unwrap().total.is_some());
}
