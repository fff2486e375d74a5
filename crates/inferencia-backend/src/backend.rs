use async_trait::async_trait;
use inferencia_core::RequestContext;

use crate::{
    error::BackendError,
    types::{ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse, ModelList},
};

/// Payload that terminates an event stream
pub const DONE_SENTINEL: &str = "[DONE]";

/// Why a sink refused a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// The inbound request was cancelled
    #[error("request cancelled")]
    Cancelled,
    /// The client is no longer reading
    #[error("client disconnected")]
    Closed,
}

/// Receiver of raw event-stream payloads
///
/// Each call carries the payload of one `data:` line, without framing.
/// Returning an error tells the adapter to stop reading from upstream.
#[async_trait]
pub trait ChunkSink: Send {
    async fn send(&mut self, payload: String) -> Result<(), SinkError>;
}

/// Capability set of an upstream inference engine
///
/// Every adapter implements all operations; an engine that cannot perform
/// one returns [`BackendError::NotImplemented`].
#[async_trait]
pub trait Backend: Send + Sync {
    /// Registry name
    fn name(&self) -> &str;

    /// Adapter kind (e.g. `mlx`)
    fn kind(&self) -> &'static str;

    /// Single round-trip chat completion
    async fn chat_completion(
        &self,
        request: ChatRequest,
        context: &RequestContext,
    ) -> Result<ChatResponse, BackendError>;

    /// Streaming chat completion
    ///
    /// Pushes every upstream payload to `sink`, including the terminal
    /// [`DONE_SENTINEL`], then returns. Stops early when the sink fails or
    /// the context is cancelled.
    async fn chat_completion_stream(
        &self,
        request: ChatRequest,
        context: &RequestContext,
        sink: &mut dyn ChunkSink,
    ) -> Result<(), BackendError>;

    /// Models the engine serves
    async fn list_models(&self, context: &RequestContext) -> Result<ModelList, BackendError>;

    /// Embeddings for the request input
    async fn create_embedding(
        &self,
        request: EmbeddingRequest,
        context: &RequestContext,
    ) -> Result<EmbeddingResponse, BackendError>;

    /// Probe whether the engine is reachable and serving
    async fn health(&self) -> Result<(), BackendError>;
}
