//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`; `AppError`
//! values convert into `HttpAppError` and render as a consistent JSON body
//! with the right status code. The wrapper exists because of the orphan
//! rule: `IntoResponse` cannot be implemented for `AppError` directly from
//! here.

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use intake_core::AppError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
}

/// Wrapper type for AppError to implement IntoResponse.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %err, "Request failed");
        } else {
            tracing::debug!(error = %err, "Request rejected");
        }

        let body = ErrorResponse {
            error: err.client_message(),
            code: err.error_code().to_string(),
        };

        let mut response = (status, Json(body)).into_response();

        if let AppError::RateLimited { retry_after_secs } = err {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.max(1).to_string()) {
                response.headers_mut().insert("Retry-After", value);
            }
        }

        response
    }
}
