//! Validate inbound chat bodies and build the upstream Chat Completions request.

use super::anthropic_types::ChatRequest;
use super::openai_types::{ChatCompletionRequest, ChatMessage};
use crate::config::UpstreamSettings;
use crate::error::{ProxyError, Result};

/// Parse and structurally validate an inbound request body.
///
/// # Errors
/// Returns `ProxyError::Validation` for malformed JSON or missing / mistyped fields.
pub fn parse_chat_request(body: &[u8]) -> Result<ChatRequest> {
    serde_json::from_slice(body)
        .map_err(|e| ProxyError::validation(format!("Invalid request body: {e}")))
}

/// Build the upstream request. The system prompt always comes first, followed by
/// the caller's messages in their original order.
pub fn chat_to_openai(req: &ChatRequest, settings: &UpstreamSettings) -> ChatCompletionRequest {
    let mut messages = Vec::with_capacity(req.messages.len() + 1);

    messages.push(ChatMessage {
        role: "system".to_string(),
        content: req.system.clone(),
    });

    messages.extend(req.messages.iter().map(|m| ChatMessage {
        role: m.role.clone(),
        content: m.content.clone(),
    }));

    ChatCompletionRequest {
        model: settings.model.clone(),
        messages,
        max_tokens: settings.max_tokens,
        temperature: settings.temperature,
    }
}
