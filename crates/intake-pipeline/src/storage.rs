//! Local file storage for processed uploads.
//!
//! Files land under the job's storage root as
//! `<stem>_<utc-nanosecond-timestamp><.ext>`, derived from the sanitized
//! original name. The write goes to a temp file in the same directory and is
//! renamed into place, so a reader never observes a partially written file.

use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{0}")]
    CreateDirFailed(String),

    #[error("{0}")]
    WriteFailed(String),
}

/// Write `content` under `root`, returning the final path.
///
/// The directory is created if absent. Name collisions (two jobs with the
/// same stem in the same nanosecond) get a numeric suffix; an existing file
/// is never overwritten.
pub async fn persist(
    root: &Path,
    original_name: &str,
    content: &[u8],
) -> Result<PathBuf, StorageError> {
    fs::create_dir_all(root).await.map_err(|e| {
        StorageError::CreateDirFailed(format!(
            "Failed to create storage directory {}: {}",
            root.display(),
            e
        ))
    })?;

    let path = unique_destination(root, original_name).await;

    // file_name is always present: unique_destination joins a non-empty name.
    let tmp = root.join(format!(
        ".{}.part",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("upload")
    ));

    let mut file = fs::File::create(&tmp).await.map_err(|e| {
        StorageError::WriteFailed(format!("Failed to create file {}: {}", tmp.display(), e))
    })?;

    file.write_all(content).await.map_err(|e| {
        StorageError::WriteFailed(format!("Failed to write file {}: {}", tmp.display(), e))
    })?;

    file.sync_all().await.map_err(|e| {
        StorageError::WriteFailed(format!("Failed to sync file {}: {}", tmp.display(), e))
    })?;

    drop(file);

    fs::rename(&tmp, &path).await.map_err(|e| {
        StorageError::WriteFailed(format!(
            "Failed to move {} into place at {}: {}",
            tmp.display(),
            path.display(),
            e
        ))
    })?;

    Ok(path)
}

/// Pick a destination that does not exist yet.
async fn unique_destination(root: &Path, original_name: &str) -> PathBuf {
    let name = Path::new(original_name);
    let stem = name
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed_file");
    let extension = name
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();

    let mut candidate = root.join(format!("{}_{}{}", stem, timestamp, extension));
    let mut attempt = 0u32;
    while fs::try_exists(&candidate).await.unwrap_or(false) {
        attempt += 1;
        candidate = root.join(format!("{}_{}_{}{}", stem, timestamp, attempt, extension));
    }
    candidate
}
