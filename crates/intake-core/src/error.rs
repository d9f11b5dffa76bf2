//! Error types module
//!
//! Unified error enum for everything the service reports to a submitter.
//! Processing-side failures (storage, queue internals) have their own error
//! types in `intake-pipeline` and are converted at the boundary where an
//! HTTP response is produced.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service overloaded: {0}")]
    Overloaded(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code this error maps to.
    pub fn http_status_code(&self) -> u16 {
        match self {
            AppError::InvalidInput(_) => 400,
            AppError::PayloadTooLarge(_) => 413,
            AppError::RateLimited { .. } => 429,
            AppError::NotFound(_) => 404,
            AppError::Overloaded(_) => 503,
            AppError::Internal(_) => 500,
        }
    }

    /// Machine-readable error code for programmatic handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::RateLimited { .. } => "RATE_LIMITED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Overloaded(_) => "QUEUE_FULL",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Client-facing message. Internal errors are not echoed verbatim.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(AppError::InvalidInput("x".into()).http_status_code(), 400);
        assert_eq!(AppError::PayloadTooLarge("x".into()).http_status_code(), 413);
        assert_eq!(
            AppError::RateLimited { retry_after_secs: 5 }.http_status_code(),
            429
        );
        assert_eq!(AppError::NotFound("x".into()).http_status_code(), 404);
        assert_eq!(AppError::Overloaded("x".into()).http_status_code(), 503);
    }

    #[test]
    fn internal_errors_are_not_echoed() {
        let err = AppError::Internal("secret path /var/data leaked".into());
        assert_eq!(err.client_message(), "Internal server error");
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn rate_limited_message_includes_retry_hint() {
        let err = AppError::RateLimited { retry_after_secs: 42 };
        assert!(err.client_message().contains("42"));
    }
}
