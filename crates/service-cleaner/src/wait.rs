//! Bounded polling for asynchronous completion.
//!
//! Provides a generic abstraction for waiting on AWS resources (or any async
//! condition) to reach a terminal state, with a fixed delay between checks and
//! a fixed attempt budget.

use anyhow::Result;
use backon::{BackoffBuilder, ConstantBuilder};
use service_cleaner_common::defaults::{DEFAULT_WAIT_DELAY_SECS, DEFAULT_WAIT_MAX_ATTEMPTS};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for bounded polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitConfig {
    /// Delay between checks
    pub delay: Duration,
    /// Maximum number of checks before giving up
    pub max_attempts: u32,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(DEFAULT_WAIT_DELAY_SECS),
            max_attempts: DEFAULT_WAIT_MAX_ATTEMPTS,
        }
    }
}

/// Poll `check` until it reports ready or the attempt budget is spent.
///
/// # Arguments
/// * `config` - Delay and attempt budget
/// * `check` - Async function that returns `Ok(true)` when ready, `Ok(false)` to retry
/// * `resource_name` - Name for logging
///
/// # Returns
/// * `Ok(attempts)` - Resource is ready after `attempts` checks
/// * `Err` - Budget exhausted, or check returned an error
pub async fn wait_for_resource<F, Fut>(
    config: &WaitConfig,
    check: F,
    resource_name: &str,
) -> Result<u32>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut delays = ConstantBuilder::default()
        .with_delay(config.delay)
        .with_max_times(max_attempts as usize)
        .build();

    let mut attempts = 0u32;

    loop {
        attempts += 1;

        match check().await {
            Ok(true) => {
                debug!(resource = %resource_name, attempts, "Resource ready");
                return Ok(attempts);
            }
            Ok(false) if attempts >= max_attempts => {
                anyhow::bail!(
                    "Timeout waiting for {} after {} attempts ({:?} apart)",
                    resource_name,
                    attempts,
                    config.delay
                );
            }
            Ok(false) => {
                let delay = delays.next().unwrap_or(config.delay);
                debug!(
                    resource = %resource_name,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "Resource not ready, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!(resource = %resource_name, error = ?e, "Resource check failed");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_attempts: u32) -> WaitConfig {
        WaitConfig {
            delay: Duration::from_secs(15),
            max_attempts,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ready_on_first_check() {
        let attempts = wait_for_resource(&fast_config(3), || async { Ok(true) }, "test")
            .await
            .unwrap();
        assert_eq!(attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ready_after_retries() {
        let calls = AtomicU32::new(0);
        let attempts = wait_for_resource(
            &fast_config(5),
            || {
                let calls = &calls;
                async move { Ok(calls.fetch_add(1, Ordering::SeqCst) >= 2) }
            },
            "test",
        )
        .await
        .unwrap();

        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn budget_exhausted() {
        let calls = AtomicU32::new(0);
        let err = wait_for_resource(
            &fast_config(4),
            || {
                let calls = &calls;
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(false)
                }
            },
            "instances",
        )
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(err.to_string().contains("Timeout waiting for instances after 4 attempts"));
    }

    #[tokio::test(start_paused = true)]
    async fn waits_fixed_delay_between_checks() {
        let start = tokio::time::Instant::now();
        let _ = wait_for_resource(&fast_config(3), || async { Ok(false) }, "test").await;
        // Three checks, two sleeps in between
        assert_eq!(start.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn check_error_stops_waiting() {
        let calls = AtomicU32::new(0);
        let result = wait_for_resource(
            &fast_config(5),
            || {
                let calls = &calls;
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(anyhow::anyhow!("boom"))
                }
            },
            "test",
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_budget_still_checks_once() {
        let attempts = wait_for_resource(&fast_config(0), || async { Ok(true) }, "test")
            .await
            .unwrap();
        assert_eq!(attempts, 1);
    }
}
