//! OpenAI-compatible request and response shapes
//!
//! Unknown top-level fields are kept so requests and responses pass through
//! the gateway without losing data it does not model.

mod chat;
mod embeddings;
mod message;
mod models;
mod tool;

pub use chat::*;
pub use embeddings::*;
pub use message::*;
pub use models::*;
pub use tool::*;
