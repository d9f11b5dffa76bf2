//! Upload submission and status endpoints.
//!
//! Submission runs the synchronous pre-enqueue checks (empty body, size
//! cap, per-source rate limit, executable denylist) and hands everything
//! else to the pipeline. The returned id is registered `Pending` before the
//! job is enqueued so a poller can never observe a gap, and rolled back if
//! the enqueue itself is refused (the caller never saw that id).

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use intake_core::models::{JobStatus, UploadJob};
use intake_core::validation::{
    has_disallowed_extension, has_executable_signature, sanitize_filename,
};
use intake_core::AppError;
use intake_pipeline::EnqueueError;

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::client_ip::ClientIp;

#[derive(Debug, Serialize)]
pub struct UploadAccepted {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct UploadStatusResponse {
    pub id: Uuid,
    pub status: JobStatus,
}

/// `POST /api/v0/uploads`
pub async fn submit_upload(
    State(state): State<AppState>,
    ClientIp(source): ClientIp,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadAccepted>), HttpAppError> {
    let (content, declared_name) = extract_multipart_file(multipart).await?;

    if content.is_empty() {
        return Err(AppError::InvalidInput("No file uploaded".to_string()).into());
    }

    let max_bytes = state.config.max_upload_size_bytes;
    if content.len() > max_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_bytes / 1024 / 1024
        ))
        .into());
    }

    state
        .rate_limiter
        .check(&source)
        .await
        .map_err(|retry_after| AppError::RateLimited {
            retry_after_secs: retry_after.as_secs().max(1),
        })?;

    if has_executable_signature(&content) || has_disallowed_extension(&declared_name) {
        tracing::warn!(
            source = %source,
            file = %declared_name,
            "Rejected executable upload"
        );
        return Err(AppError::InvalidInput("Executable files are not allowed".to_string()).into());
    }

    let sanitized_name = sanitize_filename(&declared_name);
    let id = Uuid::new_v4();
    let size_bytes = content.len();

    let job = UploadJob {
        id,
        content,
        original_name: sanitized_name.clone(),
        simulate_scan: state.config.simulate_scan,
        scan_delay: state.config.scan_delay(),
        storage_root: state.config.storage_root.clone(),
    };

    state.registry.set(id, JobStatus::Pending).await;

    if let Err(e) = state.queue.submit(job) {
        // The id was never returned to the caller; drop the orphan entry.
        state.registry.remove(id).await;
        return Err(match e {
            EnqueueError::Full => {
                AppError::Overloaded("Upload queue is full, please try again later".to_string())
            }
            EnqueueError::Closed => {
                AppError::Internal("Upload pipeline is not running".to_string())
            }
        }
        .into());
    }

    tracing::info!(
        job_id = %id,
        file = %sanitized_name,
        size_bytes,
        source = %source,
        "File queued for processing"
    );

    Ok((StatusCode::ACCEPTED, Json(UploadAccepted { id })))
}

/// `GET /api/v0/uploads/{id}/status`
pub async fn upload_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UploadStatusResponse>, HttpAppError> {
    match state.registry.get(id).await {
        Some(status) => Ok(Json(UploadStatusResponse { id, status })),
        None => Err(AppError::NotFound(format!("No upload with id {}", id)).into()),
    }
}

/// Pull the single `file` field out of a multipart body.
///
/// Returns the raw bytes and the declared filename. More than one `file`
/// field is rejected; other fields are ignored.
async fn extract_multipart_file(mut multipart: Multipart) -> Result<(Bytes, String), AppError> {
    let mut file_data: Option<Bytes> = None;
    let mut filename: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart body: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        if field_name == "file" {
            if file_data.is_some() {
                return Err(AppError::InvalidInput(
                    "Multiple file fields are not allowed; send exactly one field named 'file'"
                        .to_string(),
                ));
            }
            filename = field.file_name().map(|s: &str| s.to_string());

            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?;

            file_data = Some(data);
        }
    }

    let file_data =
        file_data.ok_or_else(|| AppError::InvalidInput("No file uploaded".to_string()))?;
    let filename = filename.unwrap_or_else(|| "unnamed_file".to_string());

    Ok((file_data, filename))
}
