//! Retry loop shared by the store adapters.
//!
//! A unit of work that fails with a transient conflict is re-run from the
//! start after an exponential backoff. Anything else, including business-rule
//! failures raised by the work itself, is returned immediately.

use std::future::Future;
use std::time::{Duration, Instant};

use finapp_core::LedgerError;

/// Default maximum number of attempts per unit of work.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default initial backoff (doubles with each attempt).
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 10;

/// Default backoff cap.
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 1000;

/// Default overall deadline for one unit of work, retries included.
pub const DEFAULT_DEADLINE_SECS: u64 = 30;

/// How a store adapter retries transient conflicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts before giving up, including the first one.
    pub max_attempts: u32,
    /// Sleep before the second attempt.
    pub initial_backoff: Duration,
    /// Upper bound on any single sleep.
    pub max_backoff: Duration,
    /// Wall-clock budget for all attempts together. `None` disables it.
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(DEFAULT_MAX_BACKOFF_MS),
            deadline: Some(Duration::from_secs(DEFAULT_DEADLINE_SECS)),
        }
    }
}

impl RetryPolicy {
    /// Backoff to sleep after the given failed attempt (1-based).
    #[must_use]
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        let shift = failed_attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1 << shift)
            .min(self.max_backoff)
    }
}

/// Run `attempt` until it succeeds, fails permanently, or the policy is spent.
///
/// Each call to `attempt` must open, run and finish (commit or roll back) one
/// transaction.
pub(crate) async fn run_with_retry<T, A, Fut>(
    policy: &RetryPolicy,
    backend: &'static str,
    mut attempt: A,
) -> Result<T, LedgerError>
where
    A: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    let started = Instant::now();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;

        let outcome = match policy.deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_sub(started.elapsed());
                if let Ok(outcome) = tokio::time::timeout(remaining, attempt()).await {
                    outcome
                } else {
                    tracing::warn!(backend, attempts, "Unit of work exceeded its deadline");
                    return Err(LedgerError::TransactionAborted {
                        attempts,
                        reason: format!("deadline of {deadline:?} exceeded"),
                    });
                }
            }
            None => attempt().await,
        };

        let err = match outcome {
            Err(err) if err.is_transient() => err,
            other => return other,
        };

        if attempts >= max_attempts {
            tracing::warn!(
                backend,
                attempts,
                error = %err,
                "Unit of work failed after max retries"
            );
            return Err(LedgerError::TransactionAborted {
                attempts,
                reason: err.to_string(),
            });
        }

        let backoff = policy.backoff(attempts);
        tracing::debug!(
            backend,
            attempt = attempts,
            backoff_ms = %backoff.as_millis(),
            error = %err,
            "Transaction conflict, retrying"
        );
        tokio::time::sleep(backoff).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            deadline: None,
        }
    }

    #[test]
    fn backoff_doubles_with_cap() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(50),
            deadline: None,
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(10));
        assert_eq!(policy.backoff(2), Duration::from_millis(20));
        assert_eq!(policy.backoff(3), Duration::from_millis(40));
        assert_eq!(policy.backoff(4), Duration::from_millis(50));
        assert_eq!(policy.backoff(40), Duration::from_millis(50));
    }

    #[tokio::test]
    async fn retries_conflicts_until_success() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result = run_with_retry(&fast_policy(5), "test", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(LedgerError::Conflict("busy".into()))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result: Result<(), _> = run_with_retry(&fast_policy(5), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LedgerError::InvalidArgument("nope".into()))
        })
        .await;

        assert!(matches!(result, Err(LedgerError::InvalidArgument(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhaustion_surfaces_transaction_aborted() {
        let result: Result<(), _> = run_with_retry(&fast_policy(3), "test", || async {
            Err(LedgerError::Conflict("busy".into()))
        })
        .await;

        assert!(matches!(
            result,
            Err(LedgerError::TransactionAborted { attempts: 3, .. })
        ));
    }

    #[tokio::test]
    async fn deadline_aborts_slow_work() {
        let policy = RetryPolicy {
            deadline: Some(Duration::from_millis(20)),
            ..fast_policy(5)
        };
        let result: Result<(), _> = run_with_retry(&policy, "test", || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(
            result,
            Err(LedgerError::TransactionAborted { attempts: 1, .. })
        ));
    }
}
