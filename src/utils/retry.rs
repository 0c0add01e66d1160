use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

// ============================================================================
// Exponential Backoff Retry
// ============================================================================
//
// - retry_with_backoff: every error is retried (broker publishes)
// - retry_on_transient: the first permanent error ends the loop (mediator
//   requests, where only concurrency conflicts are worth repeating)
//
// Both share `retry_when`; the operation receives the 1-based attempt.
//
// ============================================================================

#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Including the first call.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn conservative() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            ..Self::default()
        }
    }

    /// Short windows for optimistic-concurrency conflicts.
    pub fn for_conflicts() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(200),
            multiplier: 3.0,
        }
    }

    /// Delay to wait after the given failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let millis = self.initial_delay.as_millis() as f64 * factor;
        if !millis.is_finite() || millis >= self.max_delay.as_millis() as f64 {
            return self.max_delay;
        }
        Duration::from_millis(millis as u64)
    }
}

#[derive(Debug)]
pub enum RetryResult<T, E> {
    Success(T),
    /// Attempts exhausted.
    Failed(E),
    /// Rejected by the retry predicate.
    PermanentFailure(E),
}

impl<T, E> RetryResult<T, E> {
    pub fn into_result(self) -> Result<T, E> {
        match self {
            RetryResult::Success(value) => Ok(value),
            RetryResult::Failed(e) | RetryResult::PermanentFailure(e) => Err(e),
        }
    }
}

/// Classifies errors for `retry_on_transient`.
pub trait IsTransient {
    fn is_transient(&self) -> bool;
}

pub async fn retry_when<F, Fut, T, E, P>(
    config: RetryConfig,
    should_retry: P,
    mut operation: F,
) -> RetryResult<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let error = match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempt, "Operation succeeded after retry");
                }
                return RetryResult::Success(value);
            }
            Err(error) => error,
        };

        if !should_retry(&error) {
            tracing::debug!(attempt, error = %error, "Permanent failure, not retrying");
            return RetryResult::PermanentFailure(error);
        }
        if attempt >= max_attempts {
            tracing::error!(attempt, error = %error, "Giving up after final attempt");
            return RetryResult::Failed(error);
        }

        let delay = config.delay_after(attempt);
        tracing::warn!(
            attempt,
            error = %error,
            delay_ms = delay.as_millis() as u64,
            "Attempt failed, backing off"
        );
        sleep(delay).await;
        attempt += 1;
    }
}

pub async fn retry_with_backoff<F, Fut, T, E>(config: RetryConfig, operation: F) -> RetryResult<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_when(config, |_| true, operation).await
}

pub async fn retry_on_transient<F, Fut, T, E>(config: RetryConfig, operation: F) -> RetryResult<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display + IsTransient,
{
    retry_when(config, |e: &E| e.is_transient(), operation).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            multiplier: 2.0,
        }
    }

    #[derive(Debug)]
    enum PublishError {
        Busy,
        Rejected,
    }

    impl std::fmt::Display for PublishError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl IsTransient for PublishError {
        fn is_transient(&self) -> bool {
            matches!(self, PublishError::Busy)
        }
    }

    #[tokio::test]
    async fn test_backoff_recovers_on_third_attempt() {
        let result = retry_with_backoff(quick(3), |attempt| async move {
            if attempt < 3 {
                Err("broker busy")
            } else {
                Ok(attempt)
            }
        })
        .await;

        assert!(matches!(result, RetryResult::Success(3)));
    }

    #[tokio::test]
    async fn test_backoff_gives_up() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(quick(2), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>("broker down") }
        })
        .await;

        assert!(matches!(result, RetryResult::Failed("broker down")));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result = retry_on_transient(quick(5), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(PublishError::Rejected) }
        })
        .await;

        assert!(matches!(result, RetryResult::PermanentFailure(PublishError::Rejected)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let result = retry_on_transient(quick(4), |attempt| async move {
            if attempt < 3 {
                Err(PublishError::Busy)
            } else {
                Ok(attempt)
            }
        })
        .await;

        assert_eq!(result.into_result().unwrap(), 3);
    }

    #[test]
    fn test_delay_grows_then_caps() {
        let config = RetryConfig::for_conflicts();
        assert_eq!(config.delay_after(1), Duration::from_millis(10));
        assert_eq!(config.delay_after(2), Duration::from_millis(30));
        assert_eq!(config.delay_after(3), Duration::from_millis(90));
        assert_eq!(config.delay_after(4), Duration::from_millis(200));
        assert_eq!(config.delay_after(60), Duration::from_millis(200));
    }
}
