//! Retry helper for registry and provider requests.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::ApiError;

/// Attempts per request, including the first one.
pub const MAX_ATTEMPTS: u32 = 3;

/// Base delay; attempt `n` waits `n * BACKOFF_STEP` before the next try.
const BACKOFF_STEP: Duration = Duration::from_millis(500);

/// Retry an async request while it fails with a transient network error.
///
/// Calls `f` up to `max_attempts` times. Non-transient errors (bad status,
/// undecodable payload) are returned immediately. Returns the first
/// successful result, or the last error.
pub async fn retry_transient<F, Fut, T>(max_attempts: u32, label: &str, f: F) -> Result<T, ApiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let wait = BACKOFF_STEP * attempt;
                warn!(
                    "{} failed (attempt {}/{}), retrying in {:?}: {}",
                    label, attempt, max_attempts, wait, e
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_transient() {
                    warn!("{} failed after {} attempts: {}", label, max_attempts, e);
                }
                return Err(e);
            }
        }
    }
}
