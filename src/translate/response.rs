use super::anthropic_types::MessageResponse;
use super::openai_types::{ChatUsage, Choice};
use crate::error::{ProxyError, Result};
use serde::Deserialize;
use serde_json::Value;

/// A successfully translated upstream completion.
#[derive(Debug, Clone)]
pub struct Completion {
    pub message: MessageResponse,
    pub finish_reason: Option<String>,
    pub usage: Option<ChatUsage>,
}

/// Classify an upstream reply and translate it into an Anthropic-style message.
/// Pure function over the upstream status code and raw body text.
///
/// # Errors
/// - `ProxyError::Upstream` for a status >= 400 or a body carrying an `error` field
/// - `ProxyError::UnexpectedFormat` when no `choices[0].message.content` string exists
/// - `ProxyError::Processing` for a non-JSON body, whatever the status
pub fn openai_to_anthropic(status: u16, body: &str) -> Result<Completion> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ProxyError::processing(format!("Upstream returned invalid JSON: {e}")))?;

    if is_failure(status) || has_error_field(&value) {
        return Err(ProxyError::upstream(status, value));
    }

    let Some(text) = first_choice_text(&value) else {
        return Err(ProxyError::unexpected_format(value));
    };

    Ok(Completion {
        message: MessageResponse::text(text),
        finish_reason: value
            .pointer("/choices/0/finish_reason")
            .and_then(Value::as_str)
            .map(str::to_string),
        usage: value
            .get("usage")
            .and_then(|u| ChatUsage::deserialize(u).ok()),
    })
}

fn is_failure(status: u16) -> bool {
    status >= 400
}

fn has_error_field(value: &Value) -> bool {
    value.get("error").is_some_and(|e| !e.is_null())
}

/// Only `choices[0]` decides success; later entries are never inspected.
fn first_choice_text(value: &Value) -> Option<String> {
    let first = value.get("choices")?.as_array()?.first()?;
    Choice::deserialize(first).ok()?.message.content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::anthropic_types::ResponseContentBlock;
    use serde_json::json;

    #[test]
    fn test_simple_text_response() {
        let body = json!({
            "id": "chatcmpl-abc123",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello!"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30}
        })
        .to_string();

        let result = openai_to_anthropic(200, &body).unwrap();

        assert_eq!(result.message.role, "assistant");
        assert_eq!(
            result.message.content,
            vec![ResponseContentBlock::Text {
                text: "Hello!".to_string()
            }]
        );
        assert_eq!(result.finish_reason.as_deref(), Some("stop"));
        let usage = result.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 10);
        assert_eq!(usage.completion_tokens, 20);
    }

    #[test]
    fn test_minimal_choice_is_enough() {
        let result = openai_to_anthropic(200, r#"{"choices":[{"message":{"content":"hello"}}]}"#)
            .unwrap();
        assert_eq!(result.message, MessageResponse::text("hello"));
        assert!(result.finish_reason.is_none());
        assert!(result.usage.is_none());
    }

    #[test]
    fn test_empty_string_content_is_success() {
        let result = openai_to_anthropic(200, r#"{"choices":[{"message":{"content":""}}]}"#)
            .unwrap();
        assert_eq!(result.message, MessageResponse::text(""));
    }

    #[test]
    fn test_malformed_usage_does_not_fail_completion() {
        let result = openai_to_anthropic(
            200,
            r#"{"choices":[{"message":{"content":"ok"}}],"usage":"n/a"}"#,
        )
        .unwrap();
        assert!(result.usage.is_none());
    }

    #[test]
    fn test_error_status_passes_body_through() {
        let err = openai_to_anthropic(401, r#"{"error":"unauthorized"}"#).unwrap_err();
        match err {
            ProxyError::Upstream { status, details } => {
                assert_eq!(status, 401);
                assert_eq!(details, json!({"error": "unauthorized"}));
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[test]
    fn test_error_field_on_success_status() {
        let err = openai_to_anthropic(200, r#"{"error":{"message":"quota exceeded"}}"#)
            .unwrap_err();
        assert!(matches!(err, ProxyError::Upstream { status: 200, .. }));
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_null_error_field_is_ignored() {
        let result = openai_to_anthropic(
            200,
            r#"{"error":null,"choices":[{"message":{"content":"fine"}}]}"#,
        )
        .unwrap();
        assert_eq!(result.message, MessageResponse::text("fine"));
    }

    #[test]
    fn test_non_json_error_body_is_processing_failure() {
        let err = openai_to_anthropic(502, "Bad Gateway").unwrap_err();
        assert!(matches!(err, ProxyError::Processing { .. }));
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_body().error, "Failed to process request");
    }

    #[test]
    fn test_only_first_choice_is_inspected() {
        let result = openai_to_anthropic(
            200,
            r#"{"choices":[{"message":{"content":"hello"}},{"index":1},"junk"]}"#,
        )
        .unwrap();
        assert_eq!(result.message, MessageResponse::text("hello"));
    }

    #[test]
    fn test_non_json_success_body_is_processing_failure() {
        let err = openai_to_anthropic(200, "<html>oops</html>").unwrap_err();
        assert!(matches!(err, ProxyError::Processing { .. }));
    }

    #[test]
    fn test_unrecognized_shapes() {
        for body in [
            "{}",
            r#"{"choices":[]}"#,
            r#"{"choices":[{}]}"#,
            r#"{"choices":[{"message":{}}]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
            r#"{"choices":[{"message":{"content":[{"type":"text"}]}}]}"#,
            r#"{"choices":{"0":{"message":{"content":"not an array"}}}}"#,
            "[1,2,3]",
        ] {
            let err = openai_to_anthropic(200, body).unwrap_err();
            match err {
                ProxyError::UnexpectedFormat { details } => {
                    assert_eq!(details, serde_json::from_str::<Value>(body).unwrap());
                }
                other => panic!("expected unexpected format for {body}, got {other:?}"),
            }
        }
    }
}
