//! Shared test setup: an in-process app with a temp storage root and a
//! running ingestion worker.

use std::time::Duration;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

use intake_api::{build_router, AppState};
use intake_core::Config;
use intake_pipeline::{IngestionWorker, RateLimiter, StatusRegistry, UploadQueue};

pub struct TestApp {
    pub server: TestServer,
    pub storage: TempDir,
    pub registry: StatusRegistry,
    _worker: JoinHandle<()>,
    // Held so the worker's shutdown channel stays open for the app's lifetime.
    _shutdown_tx: mpsc::Sender<()>,
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Build an app with test-friendly defaults (no scan delay, generous rate
/// limit) and apply `customize` on top.
pub async fn setup_test_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let storage = tempfile::tempdir().unwrap();

    let mut config = Config {
        storage_root: storage.path().join("uploads"),
        simulate_scan: false,
        scan_delay_ms: 0,
        rate_limit_max_events: 100,
        ..Config::default()
    };
    customize(&mut config);

    let (queue, queue_rx) = UploadQueue::bounded(config.queue_capacity);
    let registry = StatusRegistry::new();
    let rate_limiter = RateLimiter::new(
        config.rate_limit_max_events,
        config.rate_limit_interval(),
    );

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let worker = IngestionWorker::new(queue_rx, registry.clone(), shutdown_rx).spawn();

    let state = AppState::new(config, queue, registry.clone(), rate_limiter);
    let server = TestServer::new(build_router(state)).unwrap();

    TestApp {
        server,
        storage,
        registry,
        _worker: worker,
        _shutdown_tx: shutdown_tx,
    }
}

impl TestApp {
    /// Files currently in the storage directory.
    pub fn stored_files(&self) -> Vec<String> {
        let dir = self.storage.path().join("uploads");
        if !dir.exists() {
            return Vec::new();
        }
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    /// Poll the status endpoint until the job reaches a terminal status.
    pub async fn poll_until_terminal(&self, id: &str) -> String {
        let wait = async {
            loop {
                let response = self
                    .server
                    .get(&format!("/api/v0/uploads/{}/status", id))
                    .await;
                assert_eq!(response.status_code(), 200);
                let body: serde_json::Value = response.json();
                let status = body["status"].as_str().unwrap().to_string();
                if matches!(status.as_str(), "Completed" | "Failed" | "VirusDetected") {
                    return status;
                }
                sleep(Duration::from_millis(10)).await;
            }
        };
        timeout(Duration::from_secs(5), wait)
            .await
            .expect("timed out waiting for a terminal status")
    }
}

/// A multipart form with a single `file` field.
pub fn upload_form(filename: &str, bytes: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(bytes)
            .file_name(filename)
            .mime_type("application/octet-stream"),
    )
}
