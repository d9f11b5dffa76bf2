//! Intake Pipeline
//!
//! The asynchronous half of the service: the bounded upload queue, the
//! status registry shared between pollers and the worker, the per-source
//! rate limiter, local file storage, and the single ingestion worker that
//! drains the queue.
//!
//! Everything here is an owned, injectable value; the API crate constructs
//! the stores and wires them into both the handlers and the worker.

pub mod queue;
pub mod rate_limit;
pub mod registry;
pub mod storage;
pub mod worker;

pub use queue::{EnqueueError, UploadQueue};
pub use rate_limit::RateLimiter;
pub use registry::StatusRegistry;
pub use storage::StorageError;
pub use worker::IngestionWorker;
