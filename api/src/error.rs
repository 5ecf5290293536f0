use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use network::ErrorReply;
use quorum::{PeerError, QuorumError};
use storage::StorageError;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unsupported signal: {0}")]
    UnsupportedSignal(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("RPC version mismatch: {0}")]
    VersionMismatch(String),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Staged config not found: {0}")]
    StagingNotFound(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Undecodable config: {0}")]
    Decode(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, ErrorReply::BAD_REQUEST),
            ApiError::UnsupportedSignal(_) => {
                (StatusCode::BAD_REQUEST, ErrorReply::UNSUPPORTED_SIGNAL)
            }
            ApiError::AuthError(_) => (StatusCode::UNAUTHORIZED, ErrorReply::UNAUTHORIZED),
            ApiError::VersionMismatch(_) => {
                (StatusCode::UPGRADE_REQUIRED, ErrorReply::VERSION_MISMATCH)
            }
            ApiError::UnknownMethod(_) => (StatusCode::NOT_FOUND, ErrorReply::UNKNOWN_METHOD),
            ApiError::StagingNotFound(_) => (StatusCode::NOT_FOUND, ErrorReply::STAGING_NOT_FOUND),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, ErrorReply::QUORUM_UNAVAILABLE)
            }
            ApiError::Decode(_) | ApiError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorReply::INTERNAL)
            }
        }
    }

    fn message(self) -> String {
        match self {
            ApiError::InvalidRequest(msg)
            | ApiError::UnsupportedSignal(msg)
            | ApiError::AuthError(msg)
            | ApiError::VersionMismatch(msg)
            | ApiError::UnknownMethod(msg)
            | ApiError::StagingNotFound(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::Decode(msg)
            | ApiError::InternalError(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("{}", self);
        }
        (status, Json(ErrorReply::new(code, self.message()))).into_response()
    }
}

impl From<QuorumError> for ApiError {
    fn from(err: QuorumError) -> Self {
        match err {
            QuorumError::UnsupportedSignal(_) => ApiError::UnsupportedSignal(err.to_string()),
            QuorumError::InsufficientReadQuorum { .. }
            | QuorumError::WriteQuorumUnavailable { .. } => {
                ApiError::ServiceUnavailable(err.to_string())
            }
            QuorumError::Decode { .. } => ApiError::Decode(err.to_string()),
            QuorumError::Peer {
                source: PeerError::StagingNotFound(name),
                ..
            } => ApiError::StagingNotFound(name),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<PeerError> for ApiError {
    fn from(err: PeerError) -> Self {
        match err {
            PeerError::StagingNotFound(name) => ApiError::StagingNotFound(name),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidConfig(msg) | StorageError::InvalidStagingName(msg) => {
                ApiError::InvalidRequest(msg)
            }
            StorageError::StagingNotFound(name) => ApiError::StagingNotFound(name),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quorum_errors_map_to_status() {
        let unavailable: ApiError = QuorumError::WriteQuorumUnavailable {
            required: 3,
            agreed: 2,
        }
        .into();
        assert_eq!(unavailable.status_and_code().0, StatusCode::SERVICE_UNAVAILABLE);

        let read: ApiError = QuorumError::InsufficientReadQuorum {
            required: 2,
            available: 1,
        }
        .into();
        assert_eq!(read.status_and_code().0, StatusCode::SERVICE_UNAVAILABLE);

        let signal: ApiError = QuorumError::UnsupportedSignal("status".into()).into();
        assert_eq!(
            signal.status_and_code(),
            (StatusCode::BAD_REQUEST, ErrorReply::UNSUPPORTED_SIGNAL)
        );

        let decode: ApiError = QuorumError::Decode {
            peer: "10.0.0.2:9000".into(),
            source: serde_json::from_str::<u8>("x").unwrap_err(),
        }
        .into();
        assert_eq!(decode.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_staging_not_found_keeps_its_code() {
        let err: ApiError = PeerError::StagingNotFound("config.json.abc".into()).into();
        assert_eq!(err.status_and_code(), (StatusCode::NOT_FOUND, ErrorReply::STAGING_NOT_FOUND));
    }
}
