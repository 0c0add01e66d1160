use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

// ============================================================================
// Circuit Breaker
// ============================================================================
//
// Wraps calls to the event broker so a dead broker fails fast instead of
// stalling the outbox relay on every message.
//
//   Closed ──(failure_threshold consecutive failures)──▶ Open
//   Open   ──(cool_down elapsed, next call)──────────▶ HalfOpen
//   HalfOpen ──(success_threshold successes)─────────▶ Closed
//   HalfOpen ──(any failure)─────────────────────────▶ Open
//
// The transitions live on `Breaker` and take the current instant, so they
// are tested without sleeping.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }

    /// 0=Closed, 1=Open, 2=HalfOpen.
    pub fn as_gauge(&self) -> i64 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    /// Time spent open before a probe call is admitted.
    pub cool_down: Duration,
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cool_down: Duration::from_secs(30),
            success_threshold: 3,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error("Circuit breaker is open")]
    CircuitOpen,

    #[error("Operation failed: {0}")]
    OperationFailed(E),
}

/// Outcome of a state change worth logging.
#[derive(Debug, PartialEq, Eq)]
enum Transition {
    None,
    Opened,
    Probing,
    Closed,
    Reopened,
}

#[derive(Debug)]
struct Breaker {
    state: CircuitState,
    consecutive_failures: u32,
    probe_successes: u32,
    opened_at: Option<Instant>,
}

impl Breaker {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            probe_successes: 0,
            opened_at: None,
        }
    }

    /// `false` means reject without calling.
    fn admit(&mut self, config: &CircuitBreakerConfig, now: Instant) -> (bool, Transition) {
        if self.state != CircuitState::Open {
            return (true, Transition::None);
        }
        match self.opened_at {
            Some(at) if now.duration_since(at) >= config.cool_down => {
                self.state = CircuitState::HalfOpen;
                self.probe_successes = 0;
                (true, Transition::Probing)
            }
            _ => (false, Transition::None),
        }
    }

    fn succeeded(&mut self, config: &CircuitBreakerConfig) -> Transition {
        match self.state {
            CircuitState::Closed => {
                self.consecutive_failures = 0;
                Transition::None
            }
            CircuitState::HalfOpen => {
                self.probe_successes += 1;
                if self.probe_successes < config.success_threshold {
                    return Transition::None;
                }
                *self = Self::closed();
                Transition::Closed
            }
            // A call admitted before another caller tripped the circuit.
            CircuitState::Open => Transition::None,
        }
    }

    fn failed(&mut self, config: &CircuitBreakerConfig, now: Instant) -> Transition {
        self.consecutive_failures += 1;
        match self.state {
            CircuitState::Closed if self.consecutive_failures >= config.failure_threshold => {
                self.state = CircuitState::Open;
                self.opened_at = Some(now);
                Transition::Opened
            }
            CircuitState::HalfOpen => {
                self.state = CircuitState::Open;
                self.opened_at = Some(now);
                self.probe_successes = 0;
                Transition::Reopened
            }
            _ => Transition::None,
        }
    }
}

#[derive(Clone)]
pub struct CircuitBreaker {
    name: &'static str,
    config: CircuitBreakerConfig,
    inner: Arc<Mutex<Breaker>>,
}

impl CircuitBreaker {
    pub fn new(name: &'static str, config: CircuitBreakerConfig) -> Self {
        Self {
            name,
            config,
            inner: Arc::new(Mutex::new(Breaker::closed())),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run `operation` unless the circuit is open.
    pub async fn call<F, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: std::future::Future<Output = Result<T, E>>,
    {
        let (admitted, transition) = self.inner.lock().await.admit(&self.config, Instant::now());
        self.log(transition);
        if !admitted {
            return Err(CircuitBreakerError::CircuitOpen);
        }

        let result = operation.await;

        let mut inner = self.inner.lock().await;
        let transition = match &result {
            Ok(_) => inner.succeeded(&self.config),
            Err(_) => inner.failed(&self.config, Instant::now()),
        };
        let failures = inner.consecutive_failures;
        drop(inner);

        if transition == Transition::Opened {
            tracing::warn!(breaker = self.name, failures, "Circuit breaker opened");
        } else {
            self.log(transition);
        }
        result.map_err(CircuitBreakerError::OperationFailed)
    }

    fn log(&self, transition: Transition) {
        match transition {
            Transition::Probing => tracing::info!(breaker = self.name, "Circuit breaker half-open, probing"),
            Transition::Closed => tracing::info!(breaker = self.name, "Circuit breaker closed"),
            Transition::Reopened => tracing::warn!(breaker = self.name, "Probe failed, circuit breaker reopened"),
            Transition::Opened => tracing::warn!(breaker = self.name, "Circuit breaker opened"),
            Transition::None => {}
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }

    pub async fn failure_count(&self) -> u32 {
        self.inner.lock().await.consecutive_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(failure_threshold: u32, success_threshold: u32) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold,
            cool_down: Duration::from_secs(10),
            success_threshold,
        }
    }

    #[test]
    fn test_opens_after_consecutive_failures_only() {
        let config = config(3, 1);
        let now = Instant::now();
        let mut breaker = Breaker::closed();

        breaker.failed(&config, now);
        breaker.failed(&config, now);
        breaker.succeeded(&config);
        assert_eq!(breaker.consecutive_failures, 0);

        breaker.failed(&config, now);
        breaker.failed(&config, now);
        assert_eq!(breaker.failed(&config, now), Transition::Opened);
        assert_eq!(breaker.state, CircuitState::Open);
        assert_eq!(breaker.admit(&config, now), (false, Transition::None));
    }

    #[test]
    fn test_probe_after_cool_down_closes_on_successes() {
        let config = config(1, 2);
        let opened = Instant::now();
        let mut breaker = Breaker::closed();
        breaker.failed(&config, opened);

        let later = opened + Duration::from_secs(11);
        assert_eq!(breaker.admit(&config, later), (true, Transition::Probing));
        assert_eq!(breaker.succeeded(&config), Transition::None);
        assert_eq!(breaker.succeeded(&config), Transition::Closed);
        assert_eq!(breaker.state, CircuitState::Closed);
        assert!(breaker.opened_at.is_none());
    }

    #[test]
    fn test_failed_probe_reopens() {
        let config = config(1, 1);
        let opened = Instant::now();
        let mut breaker = Breaker::closed();
        breaker.failed(&config, opened);

        let later = opened + Duration::from_secs(11);
        breaker.admit(&config, later);
        assert_eq!(breaker.failed(&config, later), Transition::Reopened);
        assert_eq!(breaker.admit(&config, later), (false, Transition::None));
    }

    #[tokio::test]
    async fn test_call_fails_fast_when_open() {
        let cb = CircuitBreaker::new("test", config(2, 1));
        for _ in 0..2 {
            let result = cb.call(async { Err::<(), _>("broker down") }).await;
            assert!(matches!(result, Err(CircuitBreakerError::OperationFailed("broker down"))));
        }
        assert_eq!(cb.state().await, CircuitState::Open);
        assert_eq!(cb.failure_count().await, 2);

        let result = cb.call(async { Ok::<_, &str>(()) }).await;
        assert!(matches!(result, Err(CircuitBreakerError::CircuitOpen)));
    }

    #[test]
    fn test_state_gauge_encoding() {
        assert_eq!(CircuitState::Closed.as_gauge(), 0);
        assert_eq!(CircuitState::Open.as_gauge(), 1);
        assert_eq!(CircuitState::HalfOpen.as_gauge(), 2);
        assert_eq!(CircuitState::HalfOpen.as_str(), "half_open");
    }
}
