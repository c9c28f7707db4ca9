//! Retry with exponential backoff for transient service overload.

use super::error::{GenerationError, GenerationResult};
use log::{info, warn};
use std::future::Future;
use std::time::Duration;

/// Backoff schedule for overloaded calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles each retry
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_delay * 2u32.saturating_pow(attempt)
    }
}

/// Run `operation`, retrying on retryable errors per `policy`.
///
/// Non-retryable errors return immediately. When retries run out the last
/// error is returned.
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    mut operation: F,
) -> GenerationResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = GenerationResult<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                info!(
                    "{} failed ({}), retry {}/{} in {}ms",
                    label,
                    err,
                    attempt + 1,
                    policy.max_retries,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                if err == GenerationError::Overloaded {
                    warn!("{} still overloaded after {} retries", label, attempt);
                }
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[test]
    fn test_delay_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_overload_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();
        let counter = calls.clone();
        let result = with_retry(RetryPolicy::default(), "test", || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(GenerationError::Overloaded)
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_three_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();
        let counter = calls.clone();
        let result: GenerationResult<()> = with_retry(RetryPolicy::default(), "test", || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(GenerationError::Overloaded) }
        })
        .await;

        assert_eq!(result, Err(GenerationError::Overloaded));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(start.elapsed() >= Duration::from_millis(7000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: GenerationResult<()> = with_retry(RetryPolicy::default(), "test", || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(GenerationError::Api("denied".into())) }
        })
        .await;

        assert_eq!(result, Err(GenerationError::Api("denied".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
