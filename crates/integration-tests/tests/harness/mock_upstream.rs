//! Mock MLX server for integration tests
//!
//! Speaks the OpenAI dialect on `/v1/*` with canned responses. The model name
//! `broken` makes chat calls fail with a 500.

use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing,
};
use bytes::Bytes;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

/// Model id returned by `/v1/models`
pub const MODEL_ID: &str = "mlx-community/Llama-3.2-3B-Instruct-4bit";

/// How streamed completions are produced
#[derive(Clone, Copy)]
enum StreamMode {
    /// Three chunks and `[DONE]` at once
    Immediate,
    /// `chunks` chunks spaced by `interval`, then `[DONE]`
    Slow { chunks: u32, interval: Duration },
}

/// Mock upstream that records what it receives
pub struct MockUpstream {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    chat_count: AtomicU32,
    stream_count: AtomicU32,
    models_count: AtomicU32,
    embedding_count: AtomicU32,
    chunks_sent: AtomicU32,
    stream_abandoned: AtomicBool,
    last_chat_body: Mutex<Option<Value>>,
    request_ids: Mutex<Vec<String>>,
    mode: StreamMode,
}

impl MockUpstream {
    /// Start the mock server, returning immediately
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(StreamMode::Immediate).await
    }

    /// Start a mock server whose streams trickle `chunks` events
    pub async fn start_slow_stream(chunks: u32, interval: Duration) -> anyhow::Result<Self> {
        Self::start_inner(StreamMode::Slow { chunks, interval }).await
    }

    async fn start_inner(mode: StreamMode) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            chat_count: AtomicU32::new(0),
            stream_count: AtomicU32::new(0),
            models_count: AtomicU32::new(0),
            embedding_count: AtomicU32::new(0),
            chunks_sent: AtomicU32::new(0),
            stream_abandoned: AtomicBool::new(false),
            last_chat_body: Mutex::new(None),
            request_ids: Mutex::new(Vec::new()),
            mode,
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
            .route("/v1/models", routing::get(handle_models))
            .route("/v1/embeddings", routing::post(handle_embeddings))
            .layer(DefaultBodyLimit::disable())
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the mock as an MLX backend
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Non-streaming chat requests received
    pub fn chat_count(&self) -> u32 {
        self.state.chat_count.load(Ordering::SeqCst)
    }

    /// Streaming chat requests received
    pub fn stream_count(&self) -> u32 {
        self.state.stream_count.load(Ordering::SeqCst)
    }

    /// Model listing requests received, health probes included
    pub fn models_count(&self) -> u32 {
        self.state.models_count.load(Ordering::SeqCst)
    }

    /// Embedding requests received
    pub fn embedding_count(&self) -> u32 {
        self.state.embedding_count.load(Ordering::SeqCst)
    }

    /// Stream chunks written before the stream ended or was abandoned
    pub fn chunks_sent(&self) -> u32 {
        self.state.chunks_sent.load(Ordering::SeqCst)
    }

    /// Whether a slow stream lost its reader before finishing
    pub fn stream_abandoned(&self) -> bool {
        self.state.stream_abandoned.load(Ordering::SeqCst)
    }

    /// Body of the most recent chat request
    pub fn last_chat_body(&self) -> Option<Value> {
        self.state.last_chat_body.lock().unwrap().clone()
    }

    /// `X-Request-ID` values seen so far
    pub fn request_ids(&self) -> Vec<String> {
        self.state.request_ids.lock().unwrap().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn record_request_id(state: &MockState, headers: &HeaderMap) {
    if let Some(id) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        state.request_ids.lock().unwrap().push(id.to_owned());
    }
}

async fn handle_chat_completions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record_request_id(&state, &headers);
    *state.last_chat_body.lock().unwrap() = Some(body.clone());

    let model = body["model"].as_str().unwrap_or("mock-model").to_owned();
    let stream = body["stream"].as_bool().unwrap_or(false);

    if stream {
        state.stream_count.fetch_add(1, Ordering::SeqCst);
    } else {
        state.chat_count.fetch_add(1, Ordering::SeqCst);
    }

    if model == "broken" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "model failed to load").into_response();
    }

    if stream {
        return stream_response(state, model);
    }

    Json(json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": model,
        "system_fingerprint": "fp_mock",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "Hello from the mock."},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 5, "completion_tokens": 4, "total_tokens": 9}
    }))
    .into_response()
}

fn chunk(model: &str, index: u32) -> String {
    json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion.chunk",
        "created": 1_700_000_000,
        "model": model,
        "mlx_timing": {"tokens_per_second": 42.5},
        "choices": [{"index": 0, "delta": {"content": format!("token{index} ")}, "finish_reason": null}]
    })
    .to_string()
}

fn stream_response(state: Arc<MockState>, model: String) -> Response {
    let (tx, rx) = mpsc::channel::<Result<Bytes, std::convert::Infallible>>(1);
    let (chunks, interval) = match state.mode {
        StreamMode::Immediate => (3, Duration::ZERO),
        StreamMode::Slow { chunks, interval } => (chunks, interval),
    };

    tokio::spawn(async move {
        for index in 0..chunks {
            let frame = format!("data: {}\n\n", chunk(&model, index));
            if tx.send(Ok(Bytes::from(frame))).await.is_err() {
                state.stream_abandoned.store(true, Ordering::SeqCst);
                return;
            }
            state.chunks_sent.fetch_add(1, Ordering::SeqCst);
            if !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }
        }
        tx.send(Ok(Bytes::from_static(b"data: [DONE]\n\n"))).await.ok();
    });

    Response::builder()
        .header("content-type", "text/event-stream")
        .body(Body::from_stream(ReceiverStream::new(rx)))
        .unwrap()
}

async fn handle_models(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Json<Value> {
    record_request_id(&state, &headers);
    state.models_count.fetch_add(1, Ordering::SeqCst);

    Json(json!({
        "object": "list",
        "data": [{"id": MODEL_ID, "object": "model", "created": 1_700_000_000, "owned_by": "mlx-community"}]
    }))
}

async fn handle_embeddings(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Json<Value> {
    state.embedding_count.fetch_add(1, Ordering::SeqCst);

    let inputs = match &body["input"] {
        Value::Array(items) => items.len(),
        _ => 1,
    };
    let data: Vec<Value> = (0..inputs)
        .map(|index| json!({"object": "embedding", "index": index, "embedding": [0.1, 0.2, 0.3]}))
        .collect();

    Json(json!({
        "object": "list",
        "model": body["model"],
        "data": data,
        "usage": {"prompt_tokens": 3, "total_tokens": 3}
    }))
}
