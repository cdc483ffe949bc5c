//! Request handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::AppState;
use crate::agent::{AgentOutcome, collect_agent_reply};
use crate::decoder::decode_text_stream;
use crate::error::{ApiError, ApiResult};

// ========== Request/Response Types ==========

/// Request to ask the agent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    #[serde(default)]
    pub input_text: String,
    /// Session to continue; a fresh one is started when absent.
    pub session_id: Option<String>,
}

/// Request for a direct model completion.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    #[serde(default)]
    pub input_text: String,
}

/// Response carrying decoded text.
#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub text: String,
}

/// Response for the health endpoint.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ========== Handlers ==========

/// Liveness probe.
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Forward one chat turn to the agent and return the aggregated reply.
///
/// POST /ask
pub async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> ApiResult<Json<TextResponse>> {
    if req.input_text.is_empty() {
        return Err(ApiError::bad_request("Missing inputText"));
    }

    let session_id = req
        .session_id
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    info!(session_id = %session_id, "forwarding chat input to agent");

    let stream = state
        .agent
        .invoke_agent(&session_id, &req.input_text, true)
        .await?;

    match collect_agent_reply(stream).await? {
        AgentOutcome::Completed { text, traces } => {
            if !traces.is_empty() {
                debug!(session_id = %session_id, notes = traces.len(), "collected trace notes");
            }
            Ok(Json(TextResponse { text }))
        }
        AgentOutcome::Failed {
            message,
            traces,
            text,
        } => Err(ApiError::AgentFailure {
            message,
            traces,
            text,
        }),
    }
}

/// Run the input through the text model directly.
///
/// POST /complete
pub async fn complete(
    State(state): State<AppState>,
    Json(req): Json<CompleteRequest>,
) -> ApiResult<Json<TextResponse>> {
    if req.input_text.is_empty() {
        return Err(ApiError::bad_request("Missing inputText"));
    }

    let stream = state.agent.invoke_model(&req.input_text).await?;
    let text = decode_text_stream(stream).await?;

    Ok(Json(TextResponse { text }))
}
