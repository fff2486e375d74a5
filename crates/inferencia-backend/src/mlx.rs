//! MLX adapter
//!
//! `mlx_lm.server` already speaks the `OpenAI` dialect, so requests are
//! forwarded as they are and stream payloads are relayed verbatim.

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use inferencia_core::{REQUEST_ID_HEADER, RequestContext};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    Backend, BackendError, ChunkSink, DONE_SENTINEL,
    types::{ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse, ModelList},
};

/// Upper bound on connection establishment, streaming included
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Adapter for an OpenAI-compatible MLX server
#[derive(Debug, Clone)]
pub struct MlxBackend {
    name: String,
    base_url: Url,
    client: Client,
    timeout: Duration,
}

impl MlxBackend {
    /// Create an adapter for the server at `base_url`
    ///
    /// `timeout` bounds non-streaming calls and health probes. Streaming
    /// calls are bounded by cancellation instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(name: String, base_url: Url, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()
            .map_err(|source| BackendError::Transport {
                backend: name.clone(),
                source,
            })?;

        Ok(Self {
            name,
            base_url,
            client,
            timeout,
        })
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/v1/{path}")
    }

    /// Request with the correlation id attached
    fn request(&self, method: Method, path: &str, context: &RequestContext) -> RequestBuilder {
        let builder = self.client.request(method, self.endpoint(path));
        match context.request_id {
            Some(ref id) => builder.header(REQUEST_ID_HEADER, id.as_str()),
            None => builder,
        }
    }

    /// Send a bounded request and fail on non-2xx statuses
    async fn send(&self, builder: RequestBuilder, operation: &'static str) -> Result<Response, BackendError> {
        let response = builder.send().await.map_err(|source| {
            tracing::error!(backend = %self.name, operation, error = %source, "upstream request failed");
            BackendError::Transport {
                backend: self.name.clone(),
                source,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(backend = %self.name, operation, status = %status, "upstream returned error");
            return Err(BackendError::Upstream {
                backend: self.name.clone(),
                status,
                body,
            });
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, BackendError> {
        let bytes = response.bytes().await.map_err(|source| BackendError::Transport {
            backend: self.name.clone(),
            source,
        })?;

        serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode {
            backend: self.name.clone(),
            message: e.to_string(),
        })
    }

    /// Run `call` unless the request is cancelled first
    async fn cancellable<T>(
        &self,
        context: &RequestContext,
        call: impl Future<Output = Result<T, BackendError>> + Send,
    ) -> Result<T, BackendError> {
        tokio::select! {
            biased;
            () = context.cancellation.cancelled() => Err(self.aborted(crate::SinkError::Cancelled)),
            result = call => result,
        }
    }

    fn aborted(&self, reason: crate::SinkError) -> BackendError {
        BackendError::Aborted {
            backend: self.name.clone(),
            reason,
        }
    }

    fn stream_error(&self, message: impl Into<String>) -> BackendError {
        BackendError::Stream {
            backend: self.name.clone(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Backend for MlxBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "mlx"
    }

    async fn chat_completion(
        &self,
        mut request: ChatRequest,
        context: &RequestContext,
    ) -> Result<ChatResponse, BackendError> {
        request.stream = false;

        let builder = self
            .request(Method::POST, "chat/completions", context)
            .timeout(self.timeout)
            .json(&request);

        self.cancellable(context, async {
            let response = self.send(builder, "chat completion").await?;
            let completion: ChatResponse = self.decode(response).await?;
            Ok(completion.into_complete())
        })
        .await
    }

    async fn chat_completion_stream(
        &self,
        mut request: ChatRequest,
        context: &RequestContext,
        sink: &mut dyn ChunkSink,
    ) -> Result<(), BackendError> {
        request.stream = true;

        let builder = self
            .request(Method::POST, "chat/completions", context)
            .header(http::header::ACCEPT, "text/event-stream")
            .json(&request);

        let response = self
            .cancellable(context, self.send(builder, "streaming chat completion"))
            .await?;

        let mut events = response.bytes_stream().eventsource();
        loop {
            let next = tokio::select! {
                biased;
                () = context.cancellation.cancelled() => return Err(self.aborted(crate::SinkError::Cancelled)),
                next = events.next() => next,
            };

            let Some(event) = next else {
                return Err(self.stream_error("upstream closed the stream before [DONE]"));
            };
            let event = event.map_err(|e| self.stream_error(e.to_string()))?;

            if event.data.is_empty() {
                continue;
            }

            let done = event.data == DONE_SENTINEL;
            sink.send(event.data).await.map_err(|reason| self.aborted(reason))?;

            if done {
                return Ok(());
            }
        }
    }

    async fn list_models(&self, context: &RequestContext) -> Result<ModelList, BackendError> {
        let builder = self.request(Method::GET, "models", context).timeout(self.timeout);

        self.cancellable(context, async {
            let response = self.send(builder, "model listing").await?;
            self.decode(response).await
        })
        .await
    }

    async fn create_embedding(
        &self,
        request: EmbeddingRequest,
        context: &RequestContext,
    ) -> Result<EmbeddingResponse, BackendError> {
        let builder = self
            .request(Method::POST, "embeddings", context)
            .timeout(self.timeout)
            .json(&request);

        self.cancellable(context, async {
            let response = self.send(builder, "embeddings").await?;
            self.decode(response).await
        })
        .await
    }

    async fn health(&self) -> Result<(), BackendError> {
        let builder = self
            .client
            .get(self.endpoint("models"))
            .timeout(self.timeout);

        self.send(builder, "health check").await.map(drop)
    }
}
