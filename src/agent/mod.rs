//! Access to the managed agent runtime.
//!
//! The `AgentInvoker` trait abstracts the remote runtime so handlers and
//! tests run against the same interface; `HttpAgentClient` is the production
//! implementation.

mod http;
mod types;

pub use http::HttpAgentClient;
pub use types::{
    AgentEvent, AgentOutcome, ChunkPayload, EMPTY_REPLY_FALLBACK, ErrorDetail, ErrorPayload,
    FailedPayload, Observation, TracePayload, collect_agent_reply,
};

use std::pin::Pin;

use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;

use crate::decoder::StreamPayload;

/// Stream of decoded agent events.
pub type AgentEventStream = Pin<Box<dyn Stream<Item = Result<AgentEvent>> + Send>>;

/// Stream of raw model-response payload frames.
pub type PayloadStream = Pin<Box<dyn Stream<Item = Result<StreamPayload>> + Send>>;

/// Interface to the managed agent runtime.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    /// Invoke the agent for one turn of a session.
    ///
    /// Returns the event stream for the turn; transport failures reject the
    /// call or surface as stream errors.
    async fn invoke_agent(
        &self,
        session_id: &str,
        input_text: &str,
        enable_trace: bool,
    ) -> Result<AgentEventStream>;

    /// Invoke the text model directly, returning its raw response stream.
    async fn invoke_model(&self, input_text: &str) -> Result<PayloadStream>;
}
