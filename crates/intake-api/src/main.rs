use std::net::SocketAddr;

use anyhow::Result;
use tokio::sync::mpsc;

use intake_api::{build_router, AppState};
use intake_core::Config;
use intake_pipeline::{IngestionWorker, RateLimiter, StatusRegistry, UploadQueue};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    intake_api::telemetry::init_telemetry();

    // Pipeline stores, constructed here and injected everywhere they are
    // needed. The queue channel is the only link between the HTTP side and
    // the worker.
    let (queue, queue_rx) = UploadQueue::bounded(config.queue_capacity);
    let registry = StatusRegistry::new();
    let rate_limiter = RateLimiter::new(
        config.rate_limit_max_events,
        config.rate_limit_interval(),
    );

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let worker = IngestionWorker::new(queue_rx, registry.clone(), shutdown_rx).spawn();

    let state = AppState::new(config.clone(), queue, registry, rate_limiter);
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    tracing::info!(addr = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        storage_root = %config.storage_root.display(),
        max_upload_mb = config.max_upload_size_bytes / 1024 / 1024,
        simulate_scan = config.simulate_scan,
        scan_delay_ms = config.scan_delay_ms,
        queue_capacity = config.queue_capacity,
        "Server ready and accepting connections"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // HTTP side is drained; stop the worker. Jobs still queued are
    // discarded, which the worker logs.
    let _ = shutdown_tx.send(()).await;
    if let Err(e) = worker.await {
        tracing::error!(error = %e, "Ingestion worker task panicked");
    }

    Ok(())
}

/// Signal handler for graceful shutdown: Ctrl+C (SIGINT) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down gracefully...");
}
