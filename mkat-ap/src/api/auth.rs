//! Trigger authentication
//!
//! Protected routes expect `Authorization: Bearer <trigger secret>`. The
//! presented and configured secrets are compared as SHA-256 digests so the
//! comparison length never depends on the input. No configured secret
//! disables the check.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

fn digest(secret: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

/// True when `presented` matches `expected`
pub fn secret_matches(presented: &str, expected: &str) -> bool {
    let presented = digest(presented);
    let expected = digest(expected);

    presented
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Pull the token out of an `Authorization: Bearer ...` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.trigger_secret.as_deref() else {
        return Ok(next.run(request).await);
    };

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token);

    match token {
        Some(token) if secret_matches(token, expected) => Ok(next.run(request).await),
        Some(_) => {
            warn!(path = %request.uri().path(), "Rejected trigger with wrong secret");
            Err(ApiError::Unauthorized("Invalid trigger secret".to_string()))
        }
        None => {
            warn!(path = %request.uri().path(), "Rejected trigger without bearer token");
            Err(ApiError::Unauthorized("Missing bearer token".to_string()))
        }
    }
}
