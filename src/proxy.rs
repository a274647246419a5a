use crate::config::UpstreamSettings;
use crate::error::{ProxyError, Result};
use crate::logging::{truncate, RequestLog, SharedLogger};
use crate::translate::anthropic_types::{ChatRequest, MessageResponse};
use crate::translate::request::{chat_to_openai, parse_chat_request};
use crate::translate::response::{openai_to_anthropic, Completion};

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, StatusCode};

/// Outcome of one chat invocation. Always exactly one of success or an error kind.
#[derive(Debug)]
pub enum ProxyReply {
    Success(MessageResponse),
    Failure(ProxyError),
}

impl ProxyReply {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Success(_) => StatusCode::OK,
            Self::Failure(err) => err.status(),
        }
    }

    /// JSON body sent to the caller.
    #[must_use]
    pub fn body(&self) -> serde_json::Value {
        let value = match self {
            Self::Success(resp) => serde_json::to_value(resp),
            Self::Failure(err) => serde_json::to_value(err.to_body()),
        };
        value.unwrap_or(serde_json::Value::Null)
    }
}

/// Forwards chat requests to one OpenAI-compatible upstream.
///
/// Holds no per-request state; one instance serves every invocation.
#[derive(Clone)]
pub struct CompletionProxy {
    settings: UpstreamSettings,
    client: reqwest::Client,
    logger: SharedLogger,
}

impl CompletionProxy {
    pub fn new(settings: UpstreamSettings, client: reqwest::Client, logger: SharedLogger) -> Self {
        Self {
            settings,
            client,
            logger,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &UpstreamSettings {
        &self.settings
    }

    /// Handle one inbound invocation. Never fails: every error becomes a
    /// `ProxyReply::Failure` carrying its status and JSON body.
    pub async fn handle(&self, method: &Method, body: &[u8]) -> ProxyReply {
        if *method != Method::POST {
            return ProxyReply::Failure(ProxyError::MethodNotAllowed);
        }

        let log = self.logger.for_request();

        let result = match parse_chat_request(body) {
            Ok(req) => self.forward(&req, &log).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(completion) => ProxyReply::Success(completion.message),
            Err(e @ ProxyError::Upstream { .. }) => {
                log.warn("proxy", format!("Provider error: {e}"));
                ProxyReply::Failure(e)
            }
            Err(e) => {
                log.error("proxy", format!("Error: {e}"));
                ProxyReply::Failure(e)
            }
        }
    }

    /// Send a parsed chat request upstream and translate the reply.
    ///
    /// # Errors
    /// Returns the `ProxyError` kind describing why no assistant message was produced.
    pub async fn forward(&self, req: &ChatRequest, log: &RequestLog) -> Result<Completion> {
        let openai_req = chat_to_openai(req, &self.settings);

        log.info(
            "proxy",
            format!(
                "POST {} model={} messages={}",
                self.settings.endpoint,
                openai_req.model,
                openai_req.messages.len()
            ),
        );

        let response = self
            .client
            .post(&self.settings.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.settings.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&openai_req)
            .send()
            .await
            .map_err(|e| ProxyError::processing(format!("Request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            ProxyError::processing(format!("Failed to read response body: {e}"))
        })?;

        log.info("proxy", format!("Response status={} body_len={}", status, body.len()));
        log.debug("proxy", format!("Response body: {}", truncate(&body, 500)));

        let completion = openai_to_anthropic(status, &body)?;

        let (input, output) = completion
            .usage
            .as_ref()
            .map_or((0, 0), |u| (u.prompt_tokens, u.completion_tokens));
        log.info(
            "proxy",
            format!(
                "Completed: finish_reason={} in={} out={} tokens",
                completion.finish_reason.as_deref().unwrap_or("unknown"),
                input,
                output
            ),
        );

        Ok(completion)
    }
}
