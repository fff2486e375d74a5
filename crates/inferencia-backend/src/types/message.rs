use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ToolCall;

/// Author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instruction
    System,
    /// Developer instruction, the newer name for system
    Developer,
    /// User message
    User,
    /// Assistant response
    Assistant,
    /// Tool result
    Tool,
    /// Legacy function result
    Function,
}

/// Chat message as sent by clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote the message
    pub role: Role,
    /// Message content, absent on assistant turns that only call tools
    #[serde(default)]
    pub content: Option<Content>,
    /// Participant name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Calls the assistant wants executed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Tool call this message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Fields the gateway does not model (e.g. `refusal`, `reasoning_content`)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(Content::Text(text.into())),
            name: None,
            tool_calls: None,
            tool_call_id: None,
            extra: Map::new(),
        }
    }
}

/// Plain text or an array of content parts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Plain text content
    Text(String),
    /// Array of content parts (text, images, audio)
    Parts(Vec<ContentPart>),
}

/// One part of structured content
///
/// Only the discriminator and text are modeled; every other field of the
/// part (`image_url`, `input_audio`, ...) is carried through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPart {
    /// Part discriminator (e.g. `text`, `image_url`)
    #[serde(rename = "type")]
    pub part_type: String,
    /// Text of a `text` part
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Remaining part fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Incremental message fragment carried by streaming chunks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delta {
    /// Role, present on the first chunk only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Text fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Partial tool calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unmodeled_message_fields_survive() {
        let raw = json!({
            "role": "assistant",
            "content": "4",
            "refusal": null,
            "reasoning_content": "2 + 2"
        });

        let message: Message = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.extra["reasoning_content"], "2 + 2");
        assert_eq!(serde_json::to_value(&message).unwrap(), raw);
    }

    #[test]
    fn image_parts_pass_through() {
        let raw = json!({
            "role": "user",
            "content": [
                {"type": "text", "text": "what is this?"},
                {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
            ]
        });

        let message: Message = serde_json::from_value(raw.clone()).unwrap();
        let Some(Content::Parts(parts)) = &message.content else {
            panic!("expected content parts");
        };
        assert_eq!(parts[1].part_type, "image_url");
        assert_eq!(serde_json::to_value(&message).unwrap(), raw);
    }
}
