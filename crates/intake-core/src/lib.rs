//! Intake Core Library
//!
//! This crate provides the domain models, error types, configuration, and
//! content validation shared by the intake pipeline and API crates.

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::AppError;
pub use models::{JobStatus, UploadJob};
