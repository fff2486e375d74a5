//! In-process backend stubs for pipeline tests

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use inferencia_backend::{
    Backend, BackendError, ChunkSink,
    types::{ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse, ModelList},
};
use inferencia_core::RequestContext;

/// What every call of a [`StubBackend`] does
#[derive(Clone, Copy)]
pub enum Behavior {
    /// Panic inside the handler's call
    Panic,
    /// Never answer
    Hang,
}

/// Backend that counts invocations and then misbehaves
pub struct StubBackend {
    name: String,
    behavior: Behavior,
    calls: AtomicU32,
}

impl StubBackend {
    pub fn new(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_owned(),
            behavior,
            calls: AtomicU32::new(0),
        }
    }

    /// Number of operations invoked so far, health probes excluded
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    async fn misbehave<T>(&self) -> Result<T, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Panic => panic!("stub backend {} panicked", self.name),
            Behavior::Hang => std::future::pending().await,
        }
    }
}

#[async_trait]
impl Backend for StubBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "stub"
    }

    async fn chat_completion(&self, _: ChatRequest, _: &RequestContext) -> Result<ChatResponse, BackendError> {
        self.misbehave().await
    }

    async fn chat_completion_stream(
        &self,
        _: ChatRequest,
        _: &RequestContext,
        _: &mut dyn ChunkSink,
    ) -> Result<(), BackendError> {
        self.misbehave().await
    }

    async fn list_models(&self, _: &RequestContext) -> Result<ModelList, BackendError> {
        self.misbehave().await
    }

    async fn create_embedding(&self, _: EmbeddingRequest, _: &RequestContext) -> Result<EmbeddingResponse, BackendError> {
        self.misbehave().await
    }

    async fn health(&self) -> Result<(), BackendError> {
        Ok(())
    }
}
