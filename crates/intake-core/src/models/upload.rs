use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Lifecycle state of a submitted upload.
///
/// Transitions are strictly forward-moving: `Pending`, then `Scanning`,
/// then either `VirusDetected` or `Processing` followed by `Completed` or
/// `Failed`. `Completed`, `Failed`, and `VirusDetected` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Scanning,
    Processing,
    Completed,
    Failed,
    VirusDetected,
}

impl JobStatus {
    /// Whether this status is terminal (the job will never change again).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::VirusDetected
        )
    }
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobStatus::Pending => write!(f, "Pending"),
            JobStatus::Scanning => write!(f, "Scanning"),
            JobStatus::Processing => write!(f, "Processing"),
            JobStatus::Completed => write!(f, "Completed"),
            JobStatus::Failed => write!(f, "Failed"),
            JobStatus::VirusDetected => write!(f, "VirusDetected"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(JobStatus::Pending),
            "Scanning" => Ok(JobStatus::Scanning),
            "Processing" => Ok(JobStatus::Processing),
            "Completed" => Ok(JobStatus::Completed),
            "Failed" => Ok(JobStatus::Failed),
            "VirusDetected" => Ok(JobStatus::VirusDetected),
            _ => Err(anyhow::anyhow!("Invalid job status: {}", s)),
        }
    }
}

/// A queued upload, owned by the queue until dequeued, then by the worker.
///
/// All fields are fixed at submission time; only the externally visible
/// status (tracked in the status registry) changes afterwards. The
/// scan settings are a per-job snapshot so configuration changes cannot
/// affect jobs already in flight.
#[derive(Debug, Clone)]
pub struct UploadJob {
    /// Correlation key across the queue, registry, and API responses.
    pub id: Uuid,
    /// Full file content, materialized in memory at submission.
    pub content: Bytes,
    /// Sanitized display name. Never used verbatim for path construction.
    pub original_name: String,
    /// Whether the worker should simulate the antivirus scan pause.
    pub simulate_scan: bool,
    /// Duration of the simulated scan pause.
    pub scan_delay: Duration,
    /// Target directory for the stored file, resolved at submission.
    pub storage_root: PathBuf,
}
