//! Shared retry helper for transient upstream failures.
//!
//! One helper, parameterized by an error classifier and a backoff schedule,
//! used identically by the connectors, the image materializer, and the
//! embedding indexer. Permanent failures are never retried; transient
//! failures are retried up to a fixed attempt count with exponential backoff.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use tracing::{debug, warn};

/// How a failure should be handled by the retry loop and by flag updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeouts, connection resets, 5xx, 429: worth retrying
    Transient,
    /// Other 4xx, corrupt data, unsupported operations: never retried
    Permanent,
}

/// Retry schedule shared by all stages.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts including the first
    pub max_attempts: u32,
    /// Initial backoff delay
    pub initial_interval: Duration,
    /// Cap on the backoff delay
    pub max_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_interval,
            max_interval: self.max_interval,
            // Attempt count bounds the loop, not elapsed time.
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

/// Terminal result of a retried operation.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Classified permanent on some attempt; carried error is that attempt's
    Permanent(E),
    /// Transient failures exhausted the attempt budget
    Exhausted(E),
}

impl<E> RetryError<E> {
    /// The underlying error, whichever way the retry loop ended.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Permanent(e) | RetryError::Exhausted(e) => e,
        }
    }

    /// Whether the failure was classified permanent.
    pub fn is_permanent(&self) -> bool {
        matches!(self, RetryError::Permanent(_))
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Permanent(e) => write!(f, "permanent failure: {}", e),
            RetryError::Exhausted(e) => write!(f, "retries exhausted: {}", e),
        }
    }
}

impl<E: fmt::Display + fmt::Debug> std::error::Error for RetryError<E> {}

/// Run `op` until it succeeds, a permanent failure is classified, or the
/// attempt budget is exhausted.
pub async fn retry_with_backoff<T, E, Op, Fut, C>(
    policy: &RetryPolicy,
    classify: C,
    mut op: Op,
) -> Result<T, RetryError<E>>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> FailureKind,
    E: fmt::Display,
{
    let mut backoff = policy.backoff();
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        debug!(attempt = attempt, "Attempting operation");

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if classify(&e) == FailureKind::Permanent {
                    warn!(attempt = attempt, error = %e, "Permanent failure, not retrying");
                    return Err(RetryError::Permanent(e));
                }

                if attempt >= policy.max_attempts {
                    warn!(attempt = attempt, error = %e, "Retry budget exhausted");
                    return Err(RetryError::Exhausted(e));
                }

                let delay = backoff
                    .next_backoff()
                    .unwrap_or(policy.max_interval);
                warn!(
                    attempt = attempt,
                    retry_in_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct FakeError {
        kind: FailureKind,
    }

    impl fmt::Display for FakeError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "fake error ({:?})", self.kind)
        }
    }

    fn classify(e: &FakeError) -> FailureKind {
        e.kind
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn test_transient_retried_until_success() {
        let attempts = AtomicU32::new(0);
        let result: Result<&str, _> = retry_with_backoff(&fast_policy(), classify, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(FakeError {
                        kind: FailureKind::Transient,
                    })
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_attempted_exactly_once() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), _> = retry_with_backoff(&fast_policy(), classify, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                Err(FakeError {
                    kind: FailureKind::Permanent,
                })
            }
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.is_permanent());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_exhausts_attempt_budget() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), _> = retry_with_backoff(&fast_policy(), classify, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                Err(FakeError {
                    kind: FailureKind::Transient,
                })
            }
        })
        .await;

        let err = result.unwrap_err();
        assert!(!err.is_permanent());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_immediate_success_single_attempt() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, RetryError<FakeError>> =
            retry_with_backoff(&fast_policy(), classify, || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Ok(42) }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
