//! Server-sent event relay from a backend stream to the client
//!
//! The backend call runs in its own task and pushes framed events through a
//! bounded channel that backs the response body. Dropping the body (client
//! gone) cancels the request context, which stops the backend call.

use std::{
    convert::Infallible,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Instant,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures_util::Stream;
use http::{HeaderValue, header};
use inferencia_backend::{Backend, ChunkSink, DONE_SENTINEL, SinkError, types::ChatRequest};
use inferencia_core::RequestContext;
use inferencia_telemetry::metrics as telemetry;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Events buffered between the backend task and the connection
const RELAY_BUFFER: usize = 32;

type Frame = Result<Bytes, Infallible>;

/// Lifecycle of one relayed stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// Headers committed, nothing relayed yet
    Opened,
    /// At least one event relayed
    Relaying,
    /// Terminal sentinel relayed
    Completed,
    /// Client went away or cancellation fired
    Aborted,
}

/// [`ChunkSink`] that frames payloads as `data: <payload>\n\n` events
pub struct RelaySink {
    tx: mpsc::Sender<Frame>,
    cancellation: CancellationToken,
    state: RelayState,
}

impl RelaySink {
    pub const fn new(tx: mpsc::Sender<Frame>, cancellation: CancellationToken) -> Self {
        Self {
            tx,
            cancellation,
            state: RelayState::Opened,
        }
    }

    pub const fn state(&self) -> RelayState {
        self.state
    }
}

#[async_trait]
impl ChunkSink for RelaySink {
    async fn send(&mut self, payload: String) -> Result<(), SinkError> {
        if self.cancellation.is_cancelled() {
            self.state = RelayState::Aborted;
            return Err(SinkError::Cancelled);
        }

        // the sentinel is relayed once, nothing follows it
        if self.state == RelayState::Completed {
            return Ok(());
        }

        let done = payload == DONE_SENTINEL;
        let frame = Bytes::from(format!("data: {payload}\n\n"));

        if self.tx.send(Ok(frame)).await.is_err() {
            self.state = RelayState::Aborted;
            return Err(SinkError::Closed);
        }

        self.state = if done { RelayState::Completed } else { RelayState::Relaying };
        Ok(())
    }
}

/// Body stream that cancels the request when dropped
struct Guarded {
    inner: ReceiverStream<Frame>,
    _cancel_on_drop: DropGuard,
}

impl Stream for Guarded {
    type Item = Frame;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Start relaying a streaming completion and return the event-stream response
///
/// Headers go out immediately. Failures after this point cannot change the
/// status, so they are logged and the stream ends without `[DONE]`.
pub fn stream(backend: Arc<dyn Backend>, request: ChatRequest, context: RequestContext) -> Response {
    let (tx, rx) = mpsc::channel(RELAY_BUFFER);
    let body = Guarded {
        inner: ReceiverStream::new(rx),
        _cancel_on_drop: context.cancellation.clone().drop_guard(),
    };

    tokio::spawn(run(backend, request, context, tx));

    let mut response = Body::from_stream(body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    response
}

async fn run(backend: Arc<dyn Backend>, request: ChatRequest, context: RequestContext, tx: mpsc::Sender<Frame>) {
    let mut sink = RelaySink::new(tx, context.cancellation.clone());
    let request_id = context.request_id.as_ref().map(ToString::to_string).unwrap_or_default();
    let started = Instant::now();

    let result = backend.chat_completion_stream(request, &context, &mut sink).await;
    telemetry::record_backend_call(backend.name(), "chat_completion_stream", started.elapsed());

    match result {
        Ok(()) => tracing::debug!(request_id = %request_id, backend = %backend.name(), state = ?sink.state(), "stream finished"),
        Err(e) if e.is_aborted() => {
            tracing::info!(request_id = %request_id, backend = %backend.name(), state = ?sink.state(), "stream aborted by client");
        }
        Err(e) => tracing::error!(
            request_id = %request_id,
            backend = %backend.name(),
            state = ?sink.state(),
            error = %e,
            "stream failed after headers were sent"
        ),
    }
}
