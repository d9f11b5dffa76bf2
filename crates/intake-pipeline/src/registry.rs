//! Shared job status registry.
//!
//! Maps job ids to their current lifecycle state. Written by the submission
//! path (initial `Pending`) and the ingestion worker (every later
//! transition); read by status pollers. Entries for issued ids are never
//! evicted. Acceptable for a bounded-scope service, and it keeps the poll
//! contract simple (absent always means "never issued").

use intake_core::models::JobStatus;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Clone-able handle to the process-wide status map.
#[derive(Clone, Default)]
pub struct StatusRegistry {
    inner: Arc<RwLock<HashMap<Uuid, JobStatus>>>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current status for a job. Writes are atomic with respect
    /// to concurrent readers; a reader sees either the previous or the new
    /// status, never anything in between.
    pub async fn set(&self, id: Uuid, status: JobStatus) {
        tracing::debug!(job_id = %id, status = %status, "Job status updated");
        self.inner.write().await.insert(id, status);
    }

    /// Current status, or `None` for an id that was never registered.
    pub async fn get(&self, id: Uuid) -> Option<JobStatus> {
        self.inner.read().await.get(&id).copied()
    }

    /// Drop an entry. Only used by the submission path to roll back an id
    /// whose job could not be enqueued; such an id was never returned to
    /// the caller, so the removal is unobservable.
    pub async fn remove(&self, id: Uuid) -> Option<JobStatus> {
        self.inner.write().await.remove(&id)
    }

    /// Number of tracked jobs.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
