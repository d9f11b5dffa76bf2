//! Bounded upload queue: the handoff point between submission handlers and
//! the ingestion worker.
//!
//! Many producers, exactly one consumer, FIFO delivery. Producers never
//! block: a full queue is reported back to the submitter immediately so the
//! submission path stays latency-bounded.

use intake_core::models::UploadJob;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    #[error("upload queue is full")]
    Full,
    #[error("upload queue is closed")]
    Closed,
}

/// Sending half of the upload queue. Cheap to clone; one handle per
/// submission context.
#[derive(Clone)]
pub struct UploadQueue {
    tx: mpsc::Sender<UploadJob>,
}

impl UploadQueue {
    /// Create a bounded queue. The receiver goes to the single
    /// [`IngestionWorker`](crate::worker::IngestionWorker); the returned
    /// handle is for producers.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<UploadJob>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Enqueue a job without blocking.
    pub fn submit(&self, job: UploadJob) -> Result<(), EnqueueError> {
        let job_id = job.id;
        self.tx.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => {
                tracing::warn!(job_id = %job_id, "Upload queue is full, rejecting job");
                EnqueueError::Full
            }
            TrySendError::Closed(_) => {
                tracing::error!(job_id = %job_id, "Upload queue receiver is gone");
                EnqueueError::Closed
            }
        })
    }
}
