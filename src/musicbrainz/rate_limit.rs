//! Minimum-interval rate limiter for registry requests.
//!
//! MusicBrainz allows one request per second per client. All registry calls,
//! including retries, go through one shared [`RateLimiter`].

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default interval between the starts of consecutive registry requests.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Serializes request starts so that no two are closer than `interval`.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until a request may start, then record it as started.
    ///
    /// The lock is held while sleeping, so concurrent callers queue up in
    /// acquisition order.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}
