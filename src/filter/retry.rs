//! Wait-then-query retry policy for remote risk checks
//!
//! Every error returned by the operation is transient here: callers turn
//! authoritative answers into `Ok` and only "no usable answer" into `Err`.

use backoff::backoff::Backoff;
use backoff::future::retry_notify;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Constant delay, handed out a fixed number of times
#[derive(Debug, Clone)]
pub struct BoundedConstant {
    delay: Duration,
    max_retries: u32,
    remaining: u32,
}

impl BoundedConstant {
    pub fn new(delay: Duration, max_retries: u32) -> Self {
        Self {
            delay,
            max_retries,
            remaining: max_retries,
        }
    }
}

impl Backoff for BoundedConstant {
    fn reset(&mut self) {
        self.remaining = self.max_retries;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.delay)
    }
}

/// Schedule for one remote query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Unconditional sleep before the first attempt
    pub initial_wait: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Sleep before each retry
    pub retry_delay: Duration,
    /// Upper bound for a single attempt
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_wait: Duration::ZERO,
            max_retries: 2,
            retry_delay: Duration::from_millis(1000),
            attempt_timeout: None,
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Worst-case duration of `run`, excluding attempts without a timeout
    pub fn worst_case(&self) -> Duration {
        let attempts = self.attempt_timeout.unwrap_or_default() * self.max_attempts();
        self.initial_wait + self.retry_delay * self.max_retries + attempts
    }

    /// Run `op` until it returns `Ok` or the retries are spent
    ///
    /// The last attempt's error is returned on exhaustion.
    pub async fn run<T, F, Fut>(&self, label: &str, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.initial_wait.is_zero() {
            debug!(check = label, wait_ms = self.initial_wait.as_millis() as u64, "Waiting before first query");
            tokio::time::sleep(self.initial_wait).await;
        }

        let op = &op;
        let attempt_timeout = self.attempt_timeout;
        let schedule = BoundedConstant::new(self.retry_delay, self.max_retries);

        retry_notify(
            schedule,
            move || async move {
                let result = match attempt_timeout {
                    Some(limit) => tokio::time::timeout(limit, op())
                        .await
                        .unwrap_or(Err(Error::RemoteTimeout(limit.as_millis() as u64))),
                    None => op().await,
                };
                result.map_err(backoff::Error::transient)
            },
            |e: Error, delay: Duration| {
                warn!(check = label, error = %e, retry_in_ms = delay.as_millis() as u64, "Attempt failed, retrying");
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;
    use tokio_test::assert_ok;

    #[test]
    fn test_bounded_constant_yields_max_retries_delays() {
        let mut backoff = BoundedConstant::new(Duration::from_millis(250), 2);
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(250)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(250)));
        assert_eq!(backoff.next_backoff(), None);

        backoff.reset();
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_worst_case() {
        let policy = RetryPolicy {
            initial_wait: Duration::from_secs(5),
            max_retries: 2,
            retry_delay: Duration::from_secs(1),
            attempt_timeout: Some(Duration::from_secs(3)),
        };
        assert_eq!(policy.worst_case(), Duration::from_secs(5 + 2 + 9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_failures() {
        let policy = RetryPolicy::default();
        let attempts = AtomicU32::new(0);

        let result = policy
            .run("test", || async {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::Remote("not indexed yet".into()))
                } else {
                    Ok(700)
                }
            })
            .await;

        assert_ok!(&result);
        assert_eq!(result.unwrap(), 700);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let policy = RetryPolicy {
            max_retries: 1,
            ..Default::default()
        };
        let attempts = AtomicU32::new(0);

        let result: Result<()> = policy
            .run("test", || async {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                Err(Error::Remote(format!("attempt {}", n)))
            })
            .await;

        assert_eq!(result.unwrap_err().to_string(), "Remote request failed: attempt 1");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_wait_precedes_first_attempt() {
        let policy = RetryPolicy {
            initial_wait: Duration::from_secs(3),
            ..Default::default()
        };
        let start = Instant::now();

        let first_attempt = policy.run("test", || async { Ok(Instant::now()) }).await.unwrap();
        assert!(first_attempt - start >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_attempt_times_out_and_retries() {
        let policy = RetryPolicy {
            max_retries: 1,
            retry_delay: Duration::ZERO,
            attempt_timeout: Some(Duration::from_millis(100)),
            ..Default::default()
        };
        let attempts = AtomicU32::new(0);

        let result = policy
            .run("test", || async {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                }
                Ok(())
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_is_single_attempt() {
        let policy = RetryPolicy {
            max_retries: 0,
            ..Default::default()
        };
        let attempts = AtomicU32::new(0);

        let result: Result<()> = policy
            .run("test", || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(Error::Remote("down".into()))
            })
            .await;

        assert!(matches!(result, Err(Error::Remote(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
