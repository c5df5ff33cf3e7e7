//! Query lifecycle and chat transcript.

mod transcript;

pub use transcript::{Message, Transcript};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::mpsc;

use crate::api::{QueryMode, QueryRequest, RagApi, StreamChunk};

/// Errors from submitting a query.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Query must not be empty")]
    EmptyQuery,

    #[error("A query is already in progress")]
    Busy,

    #[error("Query failed: {0}")]
    Query(String),
}

/// Client-side latency of one query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryMetrics {
    /// Time to the first byte of answer content.
    pub context_build: Option<Duration>,
    /// Time until the answer was complete.
    pub total: Option<Duration>,
}

/// A completed question and answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub query: String,
    pub mode: QueryMode,
    pub response: String,
    pub metrics: QueryMetrics,
}

/// Progress reported while a query runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A chunk arrived; `response` is everything received so far.
    Chunk {
        text: String,
        response: String,
        metrics: QueryMetrics,
    },
    Completed(Exchange),
    /// The query failed; `partial` is what had arrived before.
    Failed { message: String, partial: String },
}

/// Runs one query at a time against a [`RagApi`].
///
/// Clones share the in-flight flag, so a clone handed to a background task
/// still blocks a second submission from the UI.
#[derive(Debug)]
pub struct QueryController<A: RagApi> {
    api: A,
    busy: Arc<AtomicBool>,
}

impl<A: RagApi + Clone> Clone for QueryController<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            busy: Arc::clone(&self.busy),
        }
    }
}

/// Clears the in-flight flag when the submission ends, however it ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<A: RagApi> QueryController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Whether a submission is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Submit a query and follow it to completion.
    ///
    /// Events are best effort: once the receiver is gone they are dropped and
    /// the query still runs to the end.
    pub async fn submit(
        &self,
        query: &str,
        mode: QueryMode,
        stream: bool,
        events: Option<mpsc::UnboundedSender<SessionEvent>>,
    ) -> Result<Exchange, SessionError> {
        if query.trim().is_empty() {
            return Err(SessionError::EmptyQuery);
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SessionError::Busy);
        }
        let _guard = BusyGuard(&self.busy);

        let request = QueryRequest::new(query, mode, stream);
        let started = Instant::now();
        let (chunk_tx, mut chunk_rx) = mpsc::unbounded_channel::<StreamChunk>();

        let mut response = String::new();
        let mut metrics = QueryMetrics::default();

        let call = self.api.submit_query(&request, Some(chunk_tx));
        let consume = async {
            while let Some(chunk) = chunk_rx.recv().await {
                if chunk.is_final {
                    break;
                }
                if metrics.context_build.is_none() {
                    metrics.context_build = Some(started.elapsed());
                }
                response.push_str(&chunk.text);
                emit(
                    &events,
                    SessionEvent::Chunk {
                        text: chunk.text,
                        response: response.clone(),
                        metrics,
                    },
                );
            }
        };
        let (result, ()) = tokio::join!(call, consume);

        if result.is_error() {
            let message = result.message_or_default().to_string();
            tracing::warn!(mode = %mode, stream, error = %message, "query failed");
            emit(
                &events,
                SessionEvent::Failed {
                    message: message.clone(),
                    partial: response,
                },
            );
            return Err(SessionError::Query(message));
        }

        metrics.total = Some(started.elapsed());
        let exchange = Exchange {
            query: query.to_string(),
            mode,
            response,
            metrics,
        };

        tracing::info!(
            mode = %mode,
            stream,
            context_build_ms = metrics.context_build.map(|d| d.as_millis() as u64),
            total_ms = metrics.total.map(|d| d.as_millis() as u64),
            "query completed"
        );
        emit(&events, SessionEvent::Completed(exchange.clone()));
        Ok(exchange)
    }
}

fn emit(events: &Option<mpsc::UnboundedSender<SessionEvent>>, event: SessionEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_default_unset() {
        let metrics = QueryMetrics::default();
        assert!(metrics.context_build.is_none());
        assert!(metrics.total.is_none());
    }

    #[test]
    fn test_busy_guard_resets_flag() {
        let flag = AtomicBool::new(true);
        {
            let _guard = BusyGuard(&flag);
        }
        assert!(!flag.load(Ordering::Acquire));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(SessionError::EmptyQuery.to_string(), "Query must not be empty");
        assert_eq!(
            SessionError::Query("boom".into()).to_string(),
            "Query failed: boom"
        );
    }
}
