//! Typed events for the agent runtime stream.
//!
//! The wire delivers one JSON object per event whose single top-level key
//! names the kind. Events are decoded into `AgentEvent` once, at the
//! transport boundary; unknown kinds and undecodable payloads become
//! `AgentEvent::Other` and are ignored downstream.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;

/// Confirmation returned when the agent produced no completion text.
pub const EMPTY_REPLY_FALLBACK: &str = "Your update has been logged.";

/// Failure message used when a failure event carries no detail.
const GENERIC_FAILURE: &str = "Agent invocation failed";

/// Partial completion text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkPayload {
    /// UTF-8 completion bytes, base64 encoded in transit.
    #[serde(default, deserialize_with = "bytes_field")]
    pub bytes: Vec<u8>,
}

/// Diagnostic reasoning/observation notes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TracePayload {
    pub message: Option<String>,
    pub observation: Option<Observation>,
}

/// Nested observation content inside a trace.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Observation {
    pub content: Option<String>,
}

impl TracePayload {
    /// Human-readable note carried by this trace, if any.
    pub fn note(&self) -> Option<String> {
        self.message
            .clone()
            .or_else(|| self.observation.as_ref().and_then(|o| o.content.clone()))
    }
}

/// Terminal failure reported by the runtime.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FailedPayload {
    pub error: Option<ErrorDetail>,
}

/// Error detail nested inside a `failed` payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    pub message: Option<String>,
}

/// Terminal error reported by the runtime.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorPayload {
    pub message: Option<String>,
}

/// One event of an agent invocation stream.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// Partial completion text.
    Chunk(ChunkPayload),
    /// Diagnostic note, not part of the completion.
    Trace(TracePayload),
    /// Terminal failure with nested detail.
    Failed(FailedPayload),
    /// Terminal error with its own message.
    Error(ErrorPayload),
    /// Unrecognized kind. Ignored.
    Other,
}

impl AgentEvent {
    /// Decode one wire envelope. The kind is named by the single top-level
    /// key; unknown kinds map to `Other`, and a payload that does not match
    /// its kind's layout decodes as empty rather than failing the stream.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::Other;
        };
        if let Some(payload) = map.remove("chunk") {
            return Self::Chunk(decode_payload(payload));
        }
        if let Some(payload) = map.remove("failed") {
            return Self::Failed(decode_payload(payload));
        }
        if let Some(payload) = map.remove("error") {
            return Self::Error(decode_payload(payload));
        }
        if let Some(payload) = map.remove("trace") {
            return Self::Trace(decode_payload(payload));
        }
        Self::Other
    }
}

fn decode_payload<T: serde::de::DeserializeOwned + Default>(value: Value) -> T {
    serde_json::from_value(value).unwrap_or_default()
}

/// Accepts chunk bytes as base64 text or a plain byte array.
fn bytes_field<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Encoded(String),
        Raw(Vec<u8>),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Encoded(text) => BASE64
            .decode(text.as_bytes())
            .map_err(serde::de::Error::custom),
        Repr::Raw(bytes) => Ok(bytes),
    }
}

/// Final outcome of one agent invocation.
#[derive(Debug, Clone)]
pub enum AgentOutcome {
    /// The turn completed; `text` is never empty.
    Completed { text: String, traces: Vec<String> },
    /// The runtime reported a terminal failure. `text` holds whatever
    /// partial completion arrived before (or after) the failure.
    Failed {
        message: String,
        traces: Vec<String>,
        text: String,
    },
}

/// Drain an agent event stream into its final outcome.
///
/// The stream is consumed to completion even after a failure event, so
/// trailing trace notes and partial text are still collected; the first
/// recorded failure wins at reporting time. Transport errors propagate.
pub async fn collect_agent_reply<S, E>(stream: S) -> Result<AgentOutcome, E>
where
    S: Stream<Item = Result<AgentEvent, E>>,
{
    let mut stream = std::pin::pin!(stream);
    let mut text = String::new();
    let mut traces = Vec::new();
    let mut failure: Option<String> = None;

    while let Some(event) = stream.next().await {
        match event? {
            AgentEvent::Chunk(chunk) => {
                text.push_str(&String::from_utf8_lossy(&chunk.bytes));
            }
            AgentEvent::Trace(trace) => {
                if let Some(note) = trace.note() {
                    traces.push(note);
                }
            }
            AgentEvent::Failed(failed) => {
                let message = failed
                    .error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| GENERIC_FAILURE.to_string());
                failure.get_or_insert(message);
            }
            AgentEvent::Error(err) => {
                let message = err
                    .message
                    .unwrap_or_else(|| GENERIC_FAILURE.to_string());
                failure.get_or_insert(message);
            }
            AgentEvent::Other => {}
        }
    }

    let text = text.trim().to_string();
    Ok(match failure {
        Some(message) => AgentOutcome::Failed {
            message,
            traces,
            text,
        },
        None if text.is_empty() => AgentOutcome::Completed {
            text: EMPTY_REPLY_FALLBACK.to_string(),
            traces,
        },
        None => AgentOutcome::Completed { text, traces },
    })
}
