//! Decoding of streamed query answers.
//!
//! The chunk framing is a contract negotiated with the backend, so it is
//! configured rather than sniffed:
//!
//! - `raw`: every body frame received from the transport is one chunk.
//! - `ndjson`: one JSON object per line, text in `response` (or `data`/`chunk`),
//!   failures in `error`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ApiError;

const NDJSON_TEXT_KEYS: &[&str] = &["response", "data", "chunk"];

/// How a streamed body is cut into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamFraming {
    #[default]
    Raw,
    Ndjson,
}

impl fmt::Display for StreamFraming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw => f.write_str("raw"),
            Self::Ndjson => f.write_str("ndjson"),
        }
    }
}

impl FromStr for StreamFraming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" | "text" => Ok(Self::Raw),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            other => Err(format!("unknown stream framing: {other}")),
        }
    }
}

/// Incremental decoder from transport frames to text chunks.
///
/// Bytes of a UTF-8 character split across two frames are carried over to
/// the next frame instead of being replaced.
#[derive(Debug)]
pub struct ChunkDecoder {
    framing: StreamFraming,
    pending: Vec<u8>,
    line_buffer: String,
}

impl ChunkDecoder {
    pub fn new(framing: StreamFraming) -> Self {
        Self {
            framing,
            pending: Vec::new(),
            line_buffer: String::new(),
        }
    }

    /// Feed one transport frame; returns the chunks it completes.
    pub fn push(&mut self, frame: &[u8]) -> Result<Vec<String>, ApiError> {
        self.pending.extend_from_slice(frame);
        let text = self.take_utf8();

        match self.framing {
            StreamFraming::Raw => Ok(if text.is_empty() { vec![] } else { vec![text] }),
            StreamFraming::Ndjson => {
                self.line_buffer.push_str(&text);
                let mut chunks = Vec::new();
                while let Some(pos) = self.line_buffer.find('\n') {
                    let line: String = self.line_buffer.drain(..=pos).collect();
                    if let Some(chunk) = parse_ndjson_line(&line)? {
                        chunks.push(chunk);
                    }
                }
                Ok(chunks)
            }
        }
    }

    /// Flush whatever is left once the body has ended.
    pub fn finish(&mut self) -> Result<Vec<String>, ApiError> {
        let tail = String::from_utf8_lossy(&std::mem::take(&mut self.pending)).into_owned();

        match self.framing {
            StreamFraming::Raw => Ok(if tail.is_empty() { vec![] } else { vec![tail] }),
            StreamFraming::Ndjson => {
                self.line_buffer.push_str(&tail);
                let line = std::mem::take(&mut self.line_buffer);
                Ok(parse_ndjson_line(&line)?.into_iter().collect())
            }
        }
    }

    /// Decode the longest valid UTF-8 prefix of the pending bytes.
    fn take_utf8(&mut self) -> String {
        match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                let text = text.to_string();
                self.pending.clear();
                text
            }
            // Incomplete sequence at the end: keep it for the next frame.
            Err(e) if e.error_len().is_none() => {
                let valid = e.valid_up_to();
                let rest = self.pending.split_off(valid);
                let text = String::from_utf8_lossy(&self.pending).into_owned();
                self.pending = rest;
                text
            }
            Err(_) => {
                let text = String::from_utf8_lossy(&self.pending).into_owned();
                self.pending.clear();
                text
            }
        }
    }
}

fn parse_ndjson_line(line: &str) -> Result<Option<String>, ApiError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(line)
        .map_err(|e| ApiError::Parse(format!("invalid stream line {line:?}: {e}")))?;

    if let Some(error) = value.get("error").filter(|v| !v.is_null()) {
        let message = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(ApiError::Backend(message));
    }

    Ok(NDJSON_TEXT_KEYS
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .filter(|text| !text.is_empty())
        .map(str::to_string))
}
