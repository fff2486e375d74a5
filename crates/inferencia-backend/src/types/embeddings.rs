use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Embedding input: a string, an array of strings, or pre-tokenized input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbedInput {
    /// Single text input
    Single(String),
    /// Multiple text inputs
    Multiple(Vec<String>),
    /// One token array
    Tokens(Vec<u32>),
    /// Several token arrays
    TokenBatches(Vec<Vec<u32>>),
}

impl EmbedInput {
    /// Whether there is nothing to embed
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(text) => text.is_empty(),
            Self::Multiple(texts) => texts.is_empty(),
            Self::Tokens(tokens) => tokens.is_empty(),
            Self::TokenBatches(batches) => batches.is_empty(),
        }
    }
}

/// Embedding request following the `OpenAI` API format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Model identifier
    #[serde(default)]
    pub model: String,
    /// Input to embed; required, checked by the handler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<EmbedInput>,
    /// `float` or `base64`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding_format: Option<String>,
    /// Number of output dimensions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<u32>,
    /// End-user identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Engine-specific options the gateway does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Embedding vector, floats or a base64 string depending on `encoding_format`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingVector {
    Float(Vec<f64>),
    Base64(String),
}

/// Single embedding entry in the response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    /// Always `embedding`
    #[serde(default = "default_embedding_object")]
    pub object: String,
    /// Index of the corresponding input
    pub index: usize,
    pub embedding: EmbeddingVector,
}

/// Token usage for an embedding request
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EmbeddingUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Embedding response following the `OpenAI` API format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// Always `list`
    #[serde(default)]
    pub object: String,
    pub data: Vec<Embedding>,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<EmbeddingUsage>,
}

fn default_embedding_object() -> String {
    "embedding".to_string()
}
