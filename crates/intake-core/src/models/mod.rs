//! Data models for the upload pipeline.

mod upload;

pub use upload::*;
