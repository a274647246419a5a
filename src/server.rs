use crate::error::ProxyError;
use crate::proxy::{CompletionProxy, ProxyReply};

use axum::body::Body;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use bytes::Bytes;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub proxy: CompletionProxy,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    // `any` so that non-POST requests reach the handler and get its 405 body.
    Router::new()
        .route("/chat", any(handle_chat))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A body axum refuses to buffer (e.g. over the default size limit) still gets a
/// JSON reply; for non-POST methods the body is irrelevant and the 405 wins.
async fn handle_chat(
    State(state): State<Arc<AppState>>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> ProxyReply {
    match body {
        Ok(body) => state.proxy.handle(&method, &body).await,
        Err(rejection) if method == Method::POST => {
            tracing::warn!(status = %rejection.status(), "Rejected request body: {}", rejection.body_text());
            ProxyReply::Failure(ProxyError::validation(rejection.body_text()))
        }
        Err(_) => state.proxy.handle(&method, &[]).await,
    }
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

impl IntoResponse for ProxyReply {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = self.body().to_string();

        let builder = Response::builder().status(status);
        let builder = match self {
            // Bare 405: no content type, no CORS headers.
            Self::Failure(ProxyError::MethodNotAllowed) => builder,
            Self::Success(_) => builder
                .header(CONTENT_TYPE, "application/json")
                .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
                .header(ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
            Self::Failure(_) => builder
                .header(CONTENT_TYPE, "application/json")
                .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        };

        builder
            .body(Body::from(body))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
    }
}
