use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, RawQuery},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

/// Serves a router on an ephemeral port for the lifetime of the test.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::warn!("mock_server_error: {:?}", e);
        }
    });
    addr
}

fn sse_body(deltas: &[String]) -> String {
    let mut body = String::new();
    body.push_str("event: message_start\ndata: {\"type\":\"message_start\"}\n\n");
    for delta in deltas {
        let data = serde_json::json!({
            "type": "content_block_delta",
            "index": 0,
            "delta": { "type": "text_delta", "text": delta },
        });
        body.push_str(&format!("event: content_block_delta\ndata: {data}\n\n"));
    }
    body.push_str("event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n");
    body
}

pub struct MockGeneration {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<serde_json::Value>>>,
}

/// Generation upstream that replays the given deltas as one SSE
/// response and records every request body it sees.
pub async fn start_generation_mock(deltas: Vec<String>) -> MockGeneration {
    let requests: Arc<Mutex<Vec<serde_json::Value>>> = Arc::new(Mutex::new(Vec::new()));

    let router = Router::new().route("/v1/messages", {
        let requests = requests.clone();
        post(move |Json(body): Json<serde_json::Value>| {
            let requests = requests.clone();
            let deltas = deltas.clone();
            async move {
                requests.lock().unwrap().push(body);
                (
                    [("content-type", "text/event-stream")],
                    sse_body(&deltas),
                )
                    .into_response()
            }
        })
    });

    let addr = serve(router).await;
    MockGeneration { addr, requests }
}

/// Generation upstream that rejects every request before any output.
pub async fn start_generation_mock_failing() -> SocketAddr {
    let router = Router::new().route(
        "/v1/messages",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                r#"{"type":"error","error":{"type":"api_error","message":"boom"}}"#,
            )
        }),
    );
    serve(router).await
}

#[derive(Debug, Clone)]
pub struct SynthCall {
    pub voice_id: String,
    pub text: String,
    pub query: String,
    pub streaming: bool,
}

pub struct MockSynthesis {
    pub addr: SocketAddr,
    pub calls: Arc<Mutex<Vec<SynthCall>>>,
}

impl MockSynthesis {
    pub fn calls(&self) -> Vec<SynthCall> {
        self.calls.lock().unwrap().clone()
    }
}

/// Synthesis upstream. Streaming calls answer `[<text>]`; when the text
/// contains `fail_stream_matching` the streaming endpoint rejects the
/// call so the client has to escalate. The one-shot endpoint always
/// answers `(once:<text>)`.
pub async fn start_synthesis_mock(fail_stream_matching: Option<String>) -> MockSynthesis {
    let calls: Arc<Mutex<Vec<SynthCall>>> = Arc::new(Mutex::new(Vec::new()));

    let stream_route = {
        let calls = calls.clone();
        let fail = fail_stream_matching.clone();
        post(
            move |Path(voice_id): Path<String>,
                  RawQuery(query): RawQuery,
                  Json(body): Json<serde_json::Value>| {
                let calls = calls.clone();
                let fail = fail.clone();
                async move {
                    let text = body["text"].as_str().unwrap_or_default().to_string();
                    calls.lock().unwrap().push(SynthCall {
                        voice_id,
                        text: text.clone(),
                        query: query.unwrap_or_default(),
                        streaming: true,
                    });
                    if fail.as_deref().is_some_and(|f| text.contains(f)) {
                        return (StatusCode::INTERNAL_SERVER_ERROR, "scripted failure")
                            .into_response();
                    }
                    Body::from(format!("[{text}]")).into_response()
                }
            },
        )
    };

    let once_route = {
        let calls = calls.clone();
        post(
            move |Path(voice_id): Path<String>,
                  RawQuery(query): RawQuery,
                  Json(body): Json<serde_json::Value>| {
                let calls = calls.clone();
                async move {
                    let text = body["text"].as_str().unwrap_or_default().to_string();
                    calls.lock().unwrap().push(SynthCall {
                        voice_id,
                        text: text.clone(),
                        query: query.unwrap_or_default(),
                        streaming: false,
                    });
                    Body::from(format!("(once:{text})")).into_response()
                }
            },
        )
    };

    let router = Router::new()
        .route("/v1/text-to-speech/{voice_id}/stream", stream_route)
        .route("/v1/text-to-speech/{voice_id}", once_route);

    let addr = serve(router).await;
    MockSynthesis { addr, calls }
}
