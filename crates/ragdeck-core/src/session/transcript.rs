use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::QueryMetrics;

/// One question and its (possibly partial) answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub query: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
    /// True until the answer is complete or has failed.
    pub streaming: bool,
    /// Non-blank lines of `response`, for display.
    pub lines: Vec<String>,
    pub error: Option<String>,
    pub metrics: Option<QueryMetrics>,
}

impl Message {
    fn new(query: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: query.into(),
            response: String::new(),
            timestamp: Utc::now(),
            streaming: true,
            lines: Vec::new(),
            error: None,
            metrics: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

fn split_lines(response: &str) -> Vec<String> {
    response
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Append-only chat history.
///
/// Entries are addressed by id, so a late chunk for one query can never land
/// in another query's entry.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a streaming placeholder for `query`.
    pub fn begin(&mut self, query: impl Into<String>) -> Uuid {
        let message = Message::new(query);
        let id = message.id;
        self.messages.push(message);
        id
    }

    /// Replace the response of a streaming entry. Returns false when the entry
    /// is unknown or no longer streaming.
    pub fn apply_response(&mut self, id: Uuid, response: impl Into<String>) -> bool {
        match self.streaming_mut(id) {
            Some(message) => {
                message.response = response.into();
                message.lines = split_lines(&message.response);
                true
            }
            None => false,
        }
    }

    /// Mark an entry complete.
    pub fn finish(&mut self, id: Uuid, metrics: Option<QueryMetrics>) -> bool {
        match self.streaming_mut(id) {
            Some(message) => {
                message.streaming = false;
                message.metrics = metrics;
                true
            }
            None => false,
        }
    }

    /// Mark an entry failed. The partial response is kept.
    pub fn fail(&mut self, id: Uuid, error: impl Into<String>) -> bool {
        match self.streaming_mut(id) {
            Some(message) => {
                message.streaming = false;
                message.error = Some(error.into());
                true
            }
            None => false,
        }
    }

    fn streaming_mut(&mut self, id: Uuid) -> Option<&mut Message> {
        self.messages
            .iter_mut()
            .find(|m| m.id == id)
            .filter(|m| m.streaming)
    }

    pub fn get(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether any entry is still receiving an answer.
    pub fn streaming(&self) -> bool {
        self.messages.iter().any(|m| m.streaming)
    }
}
