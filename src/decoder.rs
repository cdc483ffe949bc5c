//! Stream-to-text decoding for model response streams.
//!
//! The remote stream delivers payload frames in several encodings; the frames
//! carry newline-delimited JSON whose fields hold partial model text. This
//! module turns such a stream into one aggregated string. Malformed frames and
//! lines are absorbed here: a line that fails to parse degrades to its raw
//! text, an unrecognized frame shape contributes nothing. Only errors from the
//! underlying transport propagate to the caller.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::Value;

/// One frame of a model response stream.
///
/// Upstream encodings vary by transport: raw bytes straight off the wire, a
/// JSON envelope carrying a `bytes` field, an envelope whose `chunk` holds the
/// bytes directly or nested, or plain text. Anything else is `Unknown`.
#[derive(Debug, Clone)]
pub enum StreamPayload {
    /// Raw bytes straight off the wire.
    Bytes(Bytes),
    /// Envelope with a top-level `bytes` field.
    WrappedBytes(Bytes),
    /// Envelope whose `chunk` field carries the bytes.
    WrappedChunk(Bytes),
    /// Plain text frame.
    Text(String),
    /// Unrecognized shape. Contributes nothing.
    Unknown,
}

impl StreamPayload {
    /// Decode a JSON envelope frame into a payload.
    pub fn from_envelope(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            Value::Object(map) => {
                if let Some(bytes) = map.get("bytes").and_then(base64_bytes) {
                    return Self::WrappedBytes(bytes);
                }
                if let Some(chunk) = map.get("chunk") {
                    let bytes = match chunk {
                        Value::Object(inner) => inner.get("bytes").and_then(base64_bytes),
                        other => base64_bytes(other),
                    };
                    if let Some(bytes) = bytes {
                        return Self::WrappedChunk(bytes);
                    }
                }
                Self::Unknown
            }
            _ => Self::Unknown,
        }
    }

    /// Text carried by this frame, if any.
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Bytes(bytes) | Self::WrappedBytes(bytes) | Self::WrappedChunk(bytes) => {
                Some(String::from_utf8_lossy(&bytes).into_owned())
            }
            Self::Text(text) => Some(text),
            Self::Unknown => None,
        }
    }
}

fn base64_bytes(value: &Value) -> Option<Bytes> {
    let encoded = value.as_str()?;
    BASE64.decode(encoded.as_bytes()).ok().map(Bytes::from)
}

/// Accumulates frame text and decodes it line by line.
///
/// A frame may end mid-line; the remainder stays buffered until the next
/// frame (or stream end) completes it.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: String,
    out: String,
}

impl LineDecoder {
    /// Append frame text and decode every complete line it yields.
    pub fn push(&mut self, fragment: &str) {
        self.buffer.push_str(fragment);
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            self.decode_line(line.trim());
        }
    }

    fn decode_line(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value) => {
                if let Some(text) = line_text(&value) {
                    self.out.push_str(&text);
                }
            }
            // Not JSON: keep the raw line rather than dropping it.
            Err(_) => self.out.push_str(line),
        }
    }

    /// Flush the unterminated tail, if any, and return the aggregated text.
    pub fn finish(mut self) -> String {
        let tail = self.buffer.trim();
        if !tail.is_empty() {
            self.out.push_str(tail);
        }
        self.out.trim().to_string()
    }
}

/// Model text carried by one decoded line.
///
/// Known field layouts, in order: a string `outputText`, an array `content`
/// whose elements carry string `text` fields, a string `text`. A line that
/// parses but matches none of these contributes nothing.
fn line_text(value: &Value) -> Option<String> {
    if let Some(text) = value.get("outputText").and_then(Value::as_str) {
        return Some(text.to_string());
    }
    if let Some(items) = value.get("content").and_then(Value::as_array) {
        let mut combined = String::new();
        for item in items {
            if let Some(text) = item.get("text").and_then(Value::as_str) {
                combined.push_str(text);
            }
        }
        return Some(combined);
    }
    value
        .get("text")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Decode a stream of payload frames into one aggregated string.
///
/// The stream is consumed exactly once, front to back, suspending between
/// frames. Transport errors propagate; everything else is absorbed.
pub async fn decode_text_stream<S, E>(stream: S) -> Result<String, E>
where
    S: Stream<Item = Result<StreamPayload, E>>,
{
    let mut stream = std::pin::pin!(stream);
    let mut decoder = LineDecoder::default();
    while let Some(frame) = stream.next().await {
        if let Some(text) = frame?.into_text() {
            decoder.push(&text);
        }
    }
    Ok(decoder.finish())
}
