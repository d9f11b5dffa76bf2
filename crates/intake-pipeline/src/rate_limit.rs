//! Per-source sliding-window rate limiter for upload submissions.
//!
//! Each source key keeps the timestamps of its recent submissions; entries
//! older than the window are evicted lazily on every check. A single global
//! mutex guards the whole map: per-key state is logically independent, but
//! at this service's submission rates one lock is simpler than sharding and
//! the critical section is a handful of `Instant` comparisons. Sharding the
//! map is the scale-up path if contention ever shows.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Sliding-window limiter, cheap to clone and share.
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
    max_events: usize,
    interval: Duration,
}

impl RateLimiter {
    /// `max_events` submissions per `interval`, per source key.
    pub fn new(max_events: usize, interval: Duration) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            max_events: max_events.max(1),
            interval,
        }
    }

    /// Check and record one event for `key`.
    ///
    /// Denied calls are not recorded and return how long until the oldest
    /// in-window event expires (suitable for a `Retry-After` header).
    pub async fn check(&self, key: &str) -> Result<(), Duration> {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();

        let stamps = windows.entry(key.to_string()).or_default();
        stamps.retain(|t| now.duration_since(*t) < self.interval);

        if stamps.len() >= self.max_events {
            // Timestamps are appended in order, so the first is the oldest.
            let oldest = stamps[0];
            let retry_after = self
                .interval
                .checked_sub(now.duration_since(oldest))
                .unwrap_or_default();
            tracing::warn!(
                source = %key,
                in_window = stamps.len(),
                limit = self.max_events,
                "Rate limit exceeded"
            );
            return Err(retry_after);
        }

        stamps.push(now);
        Ok(())
    }
}
