//! Service Token Middleware

use crate::error::GateError;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use platform::token::has_service_token;
use std::sync::Arc;

/// Reject requests that do not carry the shared service token
pub async fn require_service_token(
    State(expected): State<Arc<str>>,
    req: Request,
    next: Next,
) -> Response {
    if !has_service_token(req.headers(), &expected) {
        tracing::debug!(path = %req.uri().path(), "Missing or wrong service token");
        return GateError::Unauthorized.into_response();
    }

    next.run(req).await
}
