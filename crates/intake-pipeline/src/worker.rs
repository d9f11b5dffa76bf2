//! Ingestion worker: the single consumer of the upload queue.
//!
//! One long-lived task drains jobs in FIFO order and walks each through
//! scan, validate, and store, recording every transition in the status
//! registry. Exactly one job is in flight at a time; the scan pause
//! serializes the worker, not the submitters.
//!
//! A job failure is a value, not a panic: the processing step returns
//! `Result` and the loop records `Failed` and moves on, so one bad job can
//! never take the worker down. Shutdown is observed between jobs and inside
//! the scan pause; jobs still queued when it arrives are discarded.

use std::ops::ControlFlow;

use intake_core::models::{JobStatus, UploadJob};
use intake_core::validation::{classify, Verdict};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::registry::StatusRegistry;
use crate::storage;

pub struct IngestionWorker {
    rx: mpsc::Receiver<UploadJob>,
    registry: StatusRegistry,
    shutdown_rx: mpsc::Receiver<()>,
}

impl IngestionWorker {
    pub fn new(
        rx: mpsc::Receiver<UploadJob>,
        registry: StatusRegistry,
        shutdown_rx: mpsc::Receiver<()>,
    ) -> Self {
        Self {
            rx,
            registry,
            shutdown_rx,
        }
    }

    /// Spawn the worker loop. The handle resolves once the loop has
    /// observed shutdown (or the queue closed) and stopped.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        tracing::info!("Ingestion worker started");

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    tracing::info!("Shutdown signal received, discarding queued jobs");
                    break;
                }
                job = self.rx.recv() => match job {
                    Some(job) => {
                        if self.process(job).await.is_break() {
                            break;
                        }
                    }
                    None => {
                        tracing::info!("Upload queue closed, stopping worker");
                        break;
                    }
                },
            }
        }

        tracing::info!("Ingestion worker stopped");
    }

    /// Run one job through the pipeline. `Break` means shutdown interrupted
    /// the job and the loop should exit.
    async fn process(&mut self, job: UploadJob) -> ControlFlow<()> {
        let id = job.id;
        tracing::info!(
            job_id = %id,
            file = %job.original_name,
            size_bytes = job.content.len(),
            "Processing upload"
        );

        self.registry.set(id, JobStatus::Scanning).await;

        if job.simulate_scan {
            tracing::debug!(
                job_id = %id,
                delay_ms = job.scan_delay.as_millis() as u64,
                "Simulating antivirus scan"
            );
            tokio::select! {
                _ = sleep(job.scan_delay) => {}
                _ = self.shutdown_rx.recv() => {
                    tracing::info!(job_id = %id, "Scan interrupted by shutdown");
                    self.registry.set(id, JobStatus::Failed).await;
                    return ControlFlow::Break(());
                }
            }
        }

        if classify(&job.content) == Verdict::Reject {
            tracing::warn!(
                job_id = %id,
                file = %job.original_name,
                "Content failed safety validation, nothing written"
            );
            self.registry.set(id, JobStatus::VirusDetected).await;
            return ControlFlow::Continue(());
        }

        self.registry.set(id, JobStatus::Processing).await;

        match storage::persist(&job.storage_root, &job.original_name, &job.content).await {
            Ok(path) => {
                tracing::info!(job_id = %id, path = %path.display(), "Upload stored");
                self.registry.set(id, JobStatus::Completed).await;
            }
            Err(e) => {
                tracing::error!(job_id = %id, error = %e, "Failed to store upload");
                self.registry.set(id, JobStatus::Failed).await;
            }
        }

        ControlFlow::Continue(())
    }
}
