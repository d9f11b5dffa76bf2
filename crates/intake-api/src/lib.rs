//! Intake API
//!
//! HTTP boundary for the upload ingestion pipeline: the submission and
//! status endpoints, error-to-response conversion, and app wiring. The
//! binary entry point lives in `main.rs`; everything here is a library so
//! integration tests can build the app in-process.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod utils;

pub use routes::build_router;
pub use state::AppState;
