//! Retry and circuit breaking for external collaborators
//!
//! Transient collaborator failures retry with exponential backoff
//! (2ⁿ seconds, n = 0, 1, 2); repeated failures trip the breaker so the
//! Indexing stage stops hammering a dead index and fails fast until the
//! cooldown elapses.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::warn;

use crate::error::{OrchestratorError, Result};

/// Bounded exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// 2ⁿ × base for attempt n (0-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base * 2u32.saturating_pow(attempt)
    }

    /// Run an async operation with retry; only transient failures retry.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let transient =
                        err.category() == crate::error::ErrorCategory::Transient;
                    if !transient || attempt >= self.max_retries {
                        return Err(err);
                    }
                    let delay = self.backoff(attempt);
                    warn!(label, attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// Failure-counting circuit breaker
///
/// Closed until `failure_threshold` consecutive failures, then open for
/// `cooldown`; the first probe after the cooldown runs half-open and
/// closes the breaker on success.
pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    consecutive_failures: AtomicU32,
    /// Millis since `origin` of the moment the breaker opened; 0 = closed
    opened_at_ms: AtomicU64,
    origin: Instant,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold,
            cooldown,
            consecutive_failures: AtomicU32::new(0),
            opened_at_ms: AtomicU64::new(0),
            origin: Instant::now(),
        }
    }

    pub fn state(&self) -> BreakerState {
        // Stored value is elapsed-millis + 1 so 0 can mean "closed"
        let opened_at = self.opened_at_ms.load(Ordering::SeqCst);
        if opened_at == 0 {
            return BreakerState::Closed;
        }
        let now = self.origin.elapsed().as_millis() as u64 + 1;
        if now.saturating_sub(opened_at) >= self.cooldown.as_millis() as u64 {
            BreakerState::HalfOpen
        } else {
            BreakerState::Open
        }
    }

    /// Whether a call may proceed right now
    pub fn allow(&self) -> bool {
        self.state() != BreakerState::Open
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
        self.opened_at_ms.store(0, Ordering::SeqCst);
    }

    pub fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        if failures >= self.failure_threshold {
            self.opened_at_ms
                .store(self.origin.elapsed().as_millis() as u64 + 1, Ordering::SeqCst);
        }
    }

    /// Guard an async call with the breaker
    pub async fn call<T, F, Fut>(&self, label: &str, op: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        if !self.allow() {
            return Err(OrchestratorError::StageFailed {
                stage: "Indexing".to_string(),
                message: format!("circuit open for {}", label),
            });
        }
        match op().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(err) => {
                self.record_failure();
                Err(err)
            }
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(30))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient() {
        let policy = RetryPolicy {
            max_retries: 3,
            base: Duration::from_millis(1),
        };
        let attempts = AtomicUsize::new(0);
        let result: Result<u32> = policy
            .run("test", || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(OrchestratorError::Io(std::io::Error::new(
                            std::io::ErrorKind::Interrupted,
                            "flaky",
                        )))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let policy = RetryPolicy {
            max_retries: 3,
            base: Duration::from_millis(1),
        };
        let attempts = AtomicUsize::new(0);
        let result: Result<u32> = policy
            .run("test", || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(OrchestratorError::Config("bad".to_string())) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_breaker_opens_after_threshold() {
        let breaker = CircuitBreaker::new(2, Duration::from_secs(60));
        assert_eq!(breaker.state(), BreakerState::Closed);
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Closed);
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);
        assert!(!breaker.allow());
    }

    #[test]
    fn test_breaker_half_open_after_cooldown() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(0));
        breaker.record_failure();
        // Zero cooldown: immediately half-open
        assert_eq!(breaker.state(), BreakerState::HalfOpen);
        assert!(breaker.allow());
        breaker.record_success();
        assert_eq!(breaker.state(), BreakerState::Closed);
    }
}
