//! Caller-facing types: the inbound chat request and the Anthropic-style replies.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request types (what the browser sends TO us)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub system: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Response types (what we send back)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub content: Vec<ResponseContentBlock>,
    pub role: String,
}

impl MessageResponse {
    /// A single-text-block assistant reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ResponseContentBlock::Text { text: text.into() }],
            role: "assistant".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn processing_failure(message: impl Into<String>) -> Self {
        Self::new("Failed to process request").with_details(serde_json::Value::String(message.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_response_shape() {
        let resp = MessageResponse::text("hello");
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"content": [{"type": "text", "text": "hello"}], "role": "assistant"})
        );
    }

    #[test]
    fn test_chat_request_rejects_missing_system() {
        let parsed = serde_json::from_value::<ChatRequest>(json!({
            "messages": [{"role": "user", "content": "hi"}]
        }));
        assert!(parsed.is_err());
    }
}
