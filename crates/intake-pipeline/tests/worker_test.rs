//! End-to-end pipeline tests driving the queue, worker, registry, and
//! storage together.

use bytes::Bytes;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use uuid::Uuid;

use intake_core::models::{JobStatus, UploadJob};
use intake_pipeline::{IngestionWorker, StatusRegistry, UploadQueue};

struct Pipeline {
    queue: UploadQueue,
    registry: StatusRegistry,
    shutdown_tx: mpsc::Sender<()>,
    worker: JoinHandle<()>,
    storage: TempDir,
}

fn start_pipeline() -> Pipeline {
    let storage = tempfile::tempdir().unwrap();
    let (queue, rx) = UploadQueue::bounded(16);
    let registry = StatusRegistry::new();
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let worker = IngestionWorker::new(rx, registry.clone(), shutdown_rx).spawn();
    Pipeline {
        queue,
        registry,
        shutdown_tx,
        worker,
        storage,
    }
}

impl Pipeline {
    fn job(&self, content: &'static [u8], name: &str) -> UploadJob {
        UploadJob {
            id: Uuid::new_v4(),
            content: Bytes::from_static(content),
            original_name: name.to_string(),
            simulate_scan: false,
            scan_delay: Duration::ZERO,
            storage_root: self.storage.path().join("uploads"),
        }
    }

    /// Register as the submission boundary would, then enqueue.
    async fn submit(&self, job: UploadJob) {
        self.registry.set(job.id, JobStatus::Pending).await;
        self.queue.submit(job).unwrap();
    }

    async fn wait_for(&self, id: Uuid, expected: JobStatus) {
        let wait = async {
            loop {
                if self.registry.get(id).await == Some(expected) {
                    return;
                }
                sleep(Duration::from_millis(5)).await;
            }
        };
        timeout(Duration::from_secs(5), wait)
            .await
            .unwrap_or_else(|_| {
                panic!("timed out waiting for status {expected}");
            });
    }

    async fn wait_for_terminal(&self, id: Uuid) -> JobStatus {
        let wait = async {
            loop {
                if let Some(status) = self.registry.get(id).await {
                    if status.is_terminal() {
                        return status;
                    }
                }
                sleep(Duration::from_millis(5)).await;
            }
        };
        timeout(Duration::from_secs(5), wait)
            .await
            .expect("timed out waiting for a terminal status")
    }

    fn stored_files(&self) -> Vec<String> {
        let dir = self.storage.path().join("uploads");
        if !dir.exists() {
            return Vec::new();
        }
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }
}

#[tokio::test]
async fn jpeg_upload_reaches_completed_and_is_stored() {
    let pipeline = start_pipeline();
    let job = pipeline.job(&[0xFF, 0xD8, 0xFF, 0xE0, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06], "photo.jpg");
    let id = job.id;

    pipeline.submit(job).await;

    assert_eq!(pipeline.wait_for_terminal(id).await, JobStatus::Completed);
    let files = pipeline.stored_files();
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("photo_"));
    assert!(files[0].ends_with(".jpg"));
}

#[tokio::test]
async fn unrecognized_content_is_flagged_and_never_written() {
    let pipeline = start_pipeline();
    let job = pipeline.job(&[0u8; 64], "blob.bin");
    let id = job.id;

    pipeline.submit(job).await;

    assert_eq!(
        pipeline.wait_for_terminal(id).await,
        JobStatus::VirusDetected
    );
    assert!(pipeline.stored_files().is_empty());
}

#[tokio::test]
async fn storage_failure_is_isolated_to_the_job() {
    let pipeline = start_pipeline();

    // First job points its storage root at a regular file, so the write fails.
    let blocked = pipeline.storage.path().join("blocked");
    std::fs::write(&blocked, b"in the way").unwrap();
    let mut bad = pipeline.job(b"%PDF-1.7 content", "report.pdf");
    bad.storage_root = PathBuf::from(&blocked);
    let bad_id = bad.id;

    let good = pipeline.job(b"plain text content here", "notes.txt");
    let good_id = good.id;

    pipeline.submit(bad).await;
    pipeline.submit(good).await;

    assert_eq!(pipeline.wait_for_terminal(bad_id).await, JobStatus::Failed);
    // The worker must keep going after the failure.
    assert_eq!(pipeline.wait_for_terminal(good_id).await, JobStatus::Completed);
}

#[tokio::test]
async fn jobs_are_processed_in_submission_order() {
    let pipeline = start_pipeline();

    let mut first = pipeline.job(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00], "first.jpg");
    first.simulate_scan = true;
    first.scan_delay = Duration::from_millis(300);
    let first_id = first.id;

    let second = pipeline.job(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00], "second.jpg");
    let second_id = second.id;

    pipeline.submit(first).await;
    pipeline.submit(second).await;

    // While the first job is mid-scan the second has not been touched.
    pipeline.wait_for(first_id, JobStatus::Scanning).await;
    assert_eq!(
        pipeline.registry.get(second_id).await,
        Some(JobStatus::Pending)
    );

    assert_eq!(pipeline.wait_for_terminal(first_id).await, JobStatus::Completed);
    assert_eq!(pipeline.wait_for_terminal(second_id).await, JobStatus::Completed);
}

#[tokio::test]
async fn shutdown_cancels_in_flight_scan_and_discards_queue() {
    let pipeline = start_pipeline();

    let mut slow = pipeline.job(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00], "slow.jpg");
    slow.simulate_scan = true;
    slow.scan_delay = Duration::from_secs(30);
    let slow_id = slow.id;

    let queued = pipeline.job(b"queued behind the slow one", "queued.txt");
    let queued_id = queued.id;

    pipeline.submit(slow).await;
    pipeline.submit(queued).await;

    pipeline.wait_for(slow_id, JobStatus::Scanning).await;
    pipeline.shutdown_tx.send(()).await.unwrap();

    // The 30s scan must be cut short, not run to completion.
    timeout(Duration::from_secs(2), pipeline.worker)
        .await
        .expect("worker did not stop promptly")
        .unwrap();

    assert_eq!(pipeline.registry.get(slow_id).await, Some(JobStatus::Failed));
    // The queued job was discarded without ever starting.
    assert_eq!(
        pipeline.registry.get(queued_id).await,
        Some(JobStatus::Pending)
    );
    assert!(!pipeline.storage.path().join("uploads").exists());
}
