use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use network::{verify_token, RPC_VERSION, RPC_VERSION_HEADER};
use std::sync::Arc;

use crate::{ApiError, AppState};

/// Rejects requests without the cluster's bearer token.
pub async fn require_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| verify_token(value, &state.security.access_key, &state.security.secret_key))
        .unwrap_or(false);

    if !authorized {
        return ApiError::AuthError("missing or invalid bearer token".to_string()).into_response();
    }
    next.run(request).await
}

/// Rejects peer RPCs speaking another protocol version. Answers carry our
/// version so callers can tell which side is outdated.
pub async fn require_rpc_version(request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get(RPC_VERSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let mut response = match presented.as_deref() {
        Some(RPC_VERSION) => next.run(request).await,
        Some(other) => {
            ApiError::VersionMismatch(format!("expected {}, got {}", RPC_VERSION, other))
                .into_response()
        }
        None => ApiError::VersionMismatch(format!("missing {} header", RPC_VERSION_HEADER))
            .into_response(),
    };
    response
        .headers_mut()
        .insert(RPC_VERSION_HEADER, axum::http::HeaderValue::from_static(RPC_VERSION));
    response
}
