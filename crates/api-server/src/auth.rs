//! Shared-secret gate for the `/tw` routes

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use tw_core::tool::TOKEN_HEADER;

use crate::error::ApiError;
use crate::state::AppState;

/// Constant-time comparison of the presented token against the expected one
pub fn token_matches(expected: &str, presented: Option<&str>) -> bool {
    match presented {
        Some(token) => token.as_bytes().ct_eq(expected.as_bytes()).into(),
        None => false,
    }
}

fn presented_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok())
}

/// Reject the request with 403 unless `X-TW-Token` matches. Runs before any
/// extractor so the body is never read on a bad token.
pub async fn require_shared_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !token_matches(&state.config().shared_token, presented_token(request.headers())) {
        tracing::warn!(
            "Rejected {} {}: bad or missing {}",
            request.method(),
            request.uri().path(),
            TOKEN_HEADER
        );
        return Err(ApiError::Forbidden);
    }
    Ok(next.run(request).await)
}
