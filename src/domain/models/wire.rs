use serde::{Deserialize, Serialize};

use super::{Message, Role};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// One entry of the history sent over the wire: role and content only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl WireMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self::new(message.role(), message.content())
    }
}

/// Request envelope posted to `/api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<WireMessage>,
    pub model: String,
}

impl ChatRequest {
    pub fn new(messages: Vec<WireMessage>, model: impl Into<String>) -> Self {
        Self {
            messages,
            model: model.into(),
        }
    }
}

/// Structured JSON reply: `{content}`, `{error}` or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            error: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            content: None,
            error: Some(error.into()),
        }
    }

    /// Error plus renderable content, used when the server fails internally.
    pub fn degraded(error: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            error: Some(error.into()),
        }
    }
}

/// A single frame of an event-stream reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum StreamFrame {
    Text(String),
    Error(String),
}

impl StreamFrame {
    /// Encode as a `data: ` prefixed event followed by the blank-line delimiter.
    pub fn to_event(&self) -> Result<String, serde_json::Error> {
        Ok(format!("data: {}\n\n", serde_json::to_string(self)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_omits_missing_fields() {
        let json = serde_json::to_string(&ChatResponse::content("hi")).unwrap();
        assert_eq!(json, r#"{"content":"hi"}"#);

        let json = serde_json::to_string(&ChatResponse::error("bad")).unwrap();
        assert_eq!(json, r#"{"error":"bad"}"#);
    }

    #[test]
    fn frame_uses_type_and_value_keys() {
        let frame: StreamFrame = serde_json::from_str(r#"{"type":"text","value":"He"}"#).unwrap();
        assert_eq!(frame, StreamFrame::Text("He".to_string()));

        let frame: StreamFrame = serde_json::from_str(r#"{"type":"error","value":"boom"}"#).unwrap();
        assert_eq!(frame, StreamFrame::Error("boom".to_string()));
    }

    #[test]
    fn frame_event_encoding() {
        let event = StreamFrame::Text("llo".into()).to_event().unwrap();
        assert_eq!(event, "data: {\"type\":\"text\",\"value\":\"llo\"}\n\n");
    }

    #[test]
    fn request_rejects_unknown_role() {
        let raw = r#"{"messages":[{"role":"system","content":"x"}],"model":"mistral"}"#;
        assert!(serde_json::from_str::<ChatRequest>(raw).is_err());
    }
}
