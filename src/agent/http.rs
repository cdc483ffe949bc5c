//! HTTP client for the managed agent runtime.
//!
//! The runtime speaks bearer-authenticated HTTPS and streams responses as
//! newline-delimited JSON, one event envelope per line. Lines that fail to
//! decode become `AgentEvent::Other` rather than stream errors.

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use serde_json::{Value, json};
use tokio::io::AsyncBufReadExt;
use tokio_stream::wrappers::LinesStream;
use tokio_util::io::StreamReader;

use crate::config::{Config, Credentials};
use crate::decoder::StreamPayload;

use super::{AgentEvent, AgentEventStream, AgentInvoker, PayloadStream};

/// Client for the managed agent runtime API.
pub struct HttpAgentClient {
    client: reqwest::Client,
    endpoint: String,
    agent_id: String,
    agent_alias_id: String,
    model_id: String,
    token: String,
}

impl HttpAgentClient {
    /// Create a new runtime client.
    ///
    /// Only connecting is bounded by a timeout; response streams are
    /// unbounded by design.
    pub fn new(config: &Config, credentials: Credentials) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            agent_id: config.agent_id.clone(),
            agent_alias_id: config.agent_alias_id.clone(),
            model_id: config.model_id.clone(),
            token: credentials.token,
        })
    }

    fn agent_url(&self, session_id: &str) -> String {
        format!(
            "{}/agents/{}/aliases/{}/sessions/{}/text",
            self.endpoint, self.agent_id, self.agent_alias_id, session_id
        )
    }

    fn model_url(&self) -> String {
        format!("{}/models/{}/stream", self.endpoint, self.model_id)
    }

    async fn send(&self, url: &str, body: Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("connecting to agent runtime at {url}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("agent runtime returned {status}: {text}");
        }

        Ok(response)
    }
}

#[async_trait]
impl AgentInvoker for HttpAgentClient {
    async fn invoke_agent(
        &self,
        session_id: &str,
        input_text: &str,
        enable_trace: bool,
    ) -> Result<AgentEventStream> {
        let url = self.agent_url(session_id);
        let body = json!({ "inputText": input_text, "enableTrace": enable_trace });
        let response = self.send(&url, body).await?;

        let reader = StreamReader::new(response.bytes_stream().map_err(io::Error::other));
        let events = LinesStream::new(reader.lines()).map(|line| {
            let line = line.context("reading agent event stream")?;
            let event = serde_json::from_str::<Value>(&line)
                .map(AgentEvent::from_value)
                .unwrap_or(AgentEvent::Other);
            Ok(event)
        });

        Ok(Box::pin(events))
    }

    async fn invoke_model(&self, input_text: &str) -> Result<PayloadStream> {
        let url = self.model_url();
        let response = self.send(&url, json!({ "inputText": input_text })).await?;

        let frames = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(StreamPayload::Bytes)
                    .context("reading model response stream")
            });

        Ok(Box::pin(frames))
    }
}
