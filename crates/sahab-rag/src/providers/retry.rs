//! Exponential backoff shared by the HTTP providers

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{Error, Result};

/// Delay before the first retry; doubles on every further attempt
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Retry `operation` up to `max_retries` times after the first attempt
///
/// Waits `base_delay * 2^attempt` between attempts. The last error is
/// returned once the attempts run out.
pub async fn retry_with_backoff<F, Fut, T>(
    service: &str,
    max_retries: u32,
    base_delay: Duration,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..=max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt < max_retries {
                    let delay = base_delay.saturating_mul(2u32.saturating_pow(attempt));
                    tracing::warn!(
                        "{} request failed (attempt {}/{}), retrying in {:?}: {}",
                        service,
                        attempt + 1,
                        max_retries + 1,
                        delay,
                        e
                    );
                    sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::internal(format!("Unknown {} error", service))))
}
