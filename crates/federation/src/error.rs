//! Federation error type.

use fedblog_common::AppError;
use thiserror::Error;

/// Errors raised while resolving a federation request.
#[derive(Debug, Error)]
pub enum FederationError {
    #[error("Key-value store error: {0}")]
    Kv(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    App(#[from] AppError),
}

impl From<FederationError> for AppError {
    fn from(err: FederationError) -> Self {
        match err {
            FederationError::App(inner) => inner,
            other => Self::Federation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_federation_errors_are_server_errors() {
        let err: AppError = FederationError::Kv("connection reset".into()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "FEDERATION_ERROR");
    }

    #[test]
    fn test_app_error_passes_through() {
        let err: AppError = FederationError::App(AppError::Database("boom".into())).into();
        assert_eq!(err.error_code(), "DATABASE_ERROR");
    }
}
