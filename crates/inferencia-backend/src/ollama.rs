//! Ollama adapter
//!
//! Registered so configurations naming an Ollama engine load and report a
//! clear status; no operation is translated yet.

use async_trait::async_trait;
use inferencia_core::RequestContext;
use url::Url;

use crate::{
    Backend, BackendError, ChunkSink,
    types::{ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse, ModelList},
};

/// Adapter for an Ollama server
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    name: String,
    base_url: Url,
}

impl OllamaBackend {
    pub const fn new(name: String, base_url: Url) -> Self {
        Self { name, base_url }
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn not_implemented(&self, operation: &'static str) -> BackendError {
        BackendError::NotImplemented {
            backend: self.name.clone(),
            operation,
        }
    }
}

#[async_trait]
impl Backend for OllamaBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "ollama"
    }

    async fn chat_completion(
        &self,
        _request: ChatRequest,
        _context: &RequestContext,
    ) -> Result<ChatResponse, BackendError> {
        Err(self.not_implemented("chat completion"))
    }

    async fn chat_completion_stream(
        &self,
        _request: ChatRequest,
        _context: &RequestContext,
        _sink: &mut dyn ChunkSink,
    ) -> Result<(), BackendError> {
        Err(self.not_implemented("streaming chat completion"))
    }

    async fn list_models(&self, _context: &RequestContext) -> Result<ModelList, BackendError> {
        Err(self.not_implemented("model listing"))
    }

    async fn create_embedding(
        &self,
        _request: EmbeddingRequest,
        _context: &RequestContext,
    ) -> Result<EmbeddingResponse, BackendError> {
        Err(self.not_implemented("embeddings"))
    }

    async fn health(&self) -> Result<(), BackendError> {
        Err(self.not_implemented("health check"))
    }
}
