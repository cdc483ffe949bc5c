//! API integration tests.

use std::io::Write;
use std::sync::Arc;

use agent_relay::AppState;
use agent_relay::agent::{
    AgentEvent, AgentEventStream, AgentInvoker, ChunkPayload, EMPTY_REPLY_FALLBACK, PayloadStream,
};
use agent_relay::config::{Config, RuntimeEnv};
use agent_relay::decoder::StreamPayload;
use agent_relay::routes::create_router;
use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use bytes::Bytes;
use futures::stream;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Stub runtime that replays canned events.
#[derive(Default)]
struct StubInvoker {
    agent_events: Vec<AgentEvent>,
    model_frames: Vec<StreamPayload>,
    fail: bool,
}

#[async_trait]
impl AgentInvoker for StubInvoker {
    async fn invoke_agent(
        &self,
        _session_id: &str,
        _input_text: &str,
        _enable_trace: bool,
    ) -> Result<AgentEventStream> {
        if self.fail {
            anyhow::bail!("connection refused");
        }
        let events: Vec<Result<AgentEvent>> =
            self.agent_events.clone().into_iter().map(Ok).collect();
        Ok(Box::pin(stream::iter(events)))
    }

    async fn invoke_model(&self, _input_text: &str) -> Result<PayloadStream> {
        if self.fail {
            anyhow::bail!("connection refused");
        }
        let frames: Vec<Result<StreamPayload>> =
            self.model_frames.clone().into_iter().map(Ok).collect();
        Ok(Box::pin(stream::iter(frames)))
    }
}

fn test_config(public_dir: std::path::PathBuf) -> Config {
    Config {
        region: "test-1".to_string(),
        agent_id: "AGENT1".to_string(),
        agent_alias_id: "ALIAS1".to_string(),
        model_id: "text-express-v1".to_string(),
        endpoint: Config::default_endpoint("test-1"),
        runtime_env: RuntimeEnv::Cloud,
        profile: "default".to_string(),
        public_dir,
    }
}

fn test_app(stub: StubInvoker) -> Router {
    let state = AppState {
        config: Arc::new(test_config("public".into())),
        agent: Arc::new(stub),
    };
    create_router(state)
}

fn chunk(text: &str) -> AgentEvent {
    AgentEvent::Chunk(ChunkPayload {
        bytes: text.as_bytes().to_vec(),
    })
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(Method::POST)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app(StubInvoker::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .method(Method::GET)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_ask_returns_aggregated_text() {
    let app = test_app(StubInvoker {
        agent_events: vec![chunk("o"), chunk("k")],
        ..Default::default()
    });

    let response = app
        .oneshot(post_json("/ask", json!({"inputText": "log weight 180"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"text": "ok"}));
}

#[tokio::test]
async fn test_ask_missing_input_text() {
    let app = test_app(StubInvoker::default());

    let response = app
        .oneshot(post_json("/ask", json!({"sessionId": "s-1"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Missing inputText"})
    );
}

#[tokio::test]
async fn test_ask_empty_input_text() {
    let app = test_app(StubInvoker::default());

    let response = app
        .oneshot(post_json("/ask", json!({"inputText": ""})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Missing inputText"})
    );
}

#[tokio::test]
async fn test_ask_agent_failure_is_bad_gateway() {
    let failed = AgentEvent::from_value(json!({"failed": {"error": {"message": "bad input"}}}));
    let trace = AgentEvent::from_value(json!({"trace": {"message": "note"}}));
    let app = test_app(StubInvoker {
        agent_events: vec![chunk("partial"), failed, trace],
        ..Default::default()
    });

    let response = app
        .oneshot(post_json("/ask", json!({"inputText": "hi"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        body_json(response).await,
        json!({"error": "bad input", "trace": ["note"], "text": "partial"})
    );
}

#[tokio::test]
async fn test_ask_transport_failure_is_internal() {
    let app = test_app(StubInvoker {
        fail: true,
        ..Default::default()
    });

    let response = app
        .oneshot(post_json("/ask", json!({"inputText": "hi"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(
        json["error"]
            .as_str()
            .unwrap()
            .contains("connection refused")
    );
}

#[tokio::test]
async fn test_ask_empty_reply_uses_fallback() {
    let app = test_app(StubInvoker::default());

    let response = app
        .oneshot(post_json("/ask", json!({"inputText": "hi"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"text": EMPTY_REPLY_FALLBACK})
    );
}

#[tokio::test]
async fn test_complete_decodes_model_stream() {
    let app = test_app(StubInvoker {
        model_frames: vec![
            StreamPayload::Bytes(Bytes::from_static(b"{\"outputText\":\"A\"}\n")),
            StreamPayload::Bytes(Bytes::from_static(b"{\"outputText\":\"B\"}\n")),
        ],
        ..Default::default()
    });

    let response = app
        .oneshot(post_json("/complete", json!({"inputText": "hi"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"text": "AB"}));
}

#[tokio::test]
async fn test_complete_missing_input_text() {
    let app = test_app(StubInvoker::default());

    let response = app
        .oneshot(post_json("/complete", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Missing inputText"})
    );
}

#[tokio::test]
async fn test_static_assets_served_from_public_dir() {
    let dir = tempfile::tempdir().unwrap();
    let mut index = std::fs::File::create(dir.path().join("index.html")).unwrap();
    index.write_all(b"<html>chat</html>").unwrap();
    let mut script = std::fs::File::create(dir.path().join("app.js")).unwrap();
    script.write_all(b"console.log('chat');").unwrap();

    let state = AppState {
        config: Arc::new(test_config(dir.path().to_path_buf())),
        agent: Arc::new(StubInvoker::default()),
    };
    let app = create_router(state);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/")
                .method(Method::GET)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"<html>chat</html>");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/app.js")
                .method(Method::GET)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_asset_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState {
        config: Arc::new(test_config(dir.path().to_path_buf())),
        agent: Arc::new(StubInvoker::default()),
    };
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/missing.css")
                .method(Method::GET)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
