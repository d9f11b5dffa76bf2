//! Shared application state.

use std::sync::Arc;

use intake_core::Config;
use intake_pipeline::{RateLimiter, StatusRegistry, UploadQueue};

/// Everything the handlers need, injected at construction. All members are
/// cheap clone handles; the state itself is cloned per request by axum.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub queue: UploadQueue,
    pub registry: StatusRegistry,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(
        config: Config,
        queue: UploadQueue,
        registry: StatusRegistry,
        rate_limiter: RateLimiter,
    ) -> Self {
        Self {
            config: Arc::new(config),
            queue,
            registry,
            rate_limiter,
        }
    }
}
