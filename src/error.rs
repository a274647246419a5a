//! Error types for the proxy.
//!
//! Every failure the chat handler can produce is a `ProxyError`. `status()` and
//! `to_body()` turn it into the HTTP status and JSON body returned to the caller,
//! so the handler never lets an error escape.

use crate::translate::anthropic_types::ErrorBody;
use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProxyError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Invalid request: {message}")]
    Validation { message: String },

    #[error("Upstream returned status {status}")]
    Upstream { status: u16, details: Value },

    #[error("Unexpected response format")]
    UnexpectedFormat { details: Value },

    #[error("{message}")]
    Processing { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ProxyError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Upstream failure, keeping the status the upstream actually sent.
    pub fn upstream(status: u16, details: Value) -> Self {
        Self::Upstream { status, details }
    }

    pub fn unexpected_format(details: Value) -> Self {
        Self::UnexpectedFormat { details }
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// HTTP status reported to the caller.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            // A success status whose body carried an `error` field is reported as 500
            Self::Upstream { status, .. } if *status >= 400 => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body reported to the caller.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        match self {
            Self::MethodNotAllowed => ErrorBody::new("Method not allowed"),
            Self::Validation { message } => {
                ErrorBody::new("Invalid request").with_details(Value::String(message.clone()))
            }
            Self::Upstream { details, .. } => ErrorBody::new("API Error").with_details(details.clone()),
            Self::UnexpectedFormat { details } => {
                ErrorBody::new("Unexpected response format").with_details(details.clone())
            }
            Self::Processing { message } => ErrorBody::processing_failure(message.clone()),
            other => ErrorBody::processing_failure(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_not_allowed_has_no_details() {
        let err = ProxyError::MethodNotAllowed;
        assert_eq!(err.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            serde_json::to_value(err.to_body()).unwrap(),
            json!({"error": "Method not allowed"})
        );
    }

    #[test]
    fn test_upstream_status_propagates() {
        let err = ProxyError::upstream(401, json!({"error": "unauthorized"}));
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            serde_json::to_value(err.to_body()).unwrap(),
            json!({"error": "API Error", "details": {"error": "unauthorized"}})
        );
    }

    #[test]
    fn test_upstream_success_status_with_error_field_is_500() {
        let err = ProxyError::upstream(200, json!({"error": "quota"}));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Upstream returned status 200");
    }

    #[test]
    fn test_ambient_errors_report_as_processing_failure() {
        let err = ProxyError::config("no key");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::to_value(err.to_body()).unwrap();
        assert_eq!(body["error"], "Failed to process request");
        assert_eq!(body["details"], "Configuration error: no key");
    }

    #[test]
    fn test_validation_is_bad_request() {
        let err = ProxyError::validation("missing field `system`");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_body().error, "Invalid request");
    }
}
