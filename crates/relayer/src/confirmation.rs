//! Confirmation waiting
//!
//! Bounded-retry polling for callers that need to observe a condition (a
//! reconciled sequence, a finalized undelegation) before proceeding. The
//! core state machines never block; this primitive lives strictly above
//! them. Cancellation is dropping the returned future. On timeout the
//! caller is expected to resubmit with a fresh validity window rather than
//! rely on any implicit retry.

use std::time::Duration;
use thiserror::Error;

/// Bounded retry schedule for a confirmation wait.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum polling attempts before giving up
    pub max_attempts: u32,
    /// Delay between attempts
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_millis(50),
        }
    }
}

/// Confirmation wait failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationError {
    #[error("condition not met after {attempts} attempts")]
    TimedOut { attempts: u32 },
}

/// Poll `check` until it yields a value or the policy is exhausted.
pub async fn wait_until<T, F>(policy: RetryPolicy, mut check: F) -> Result<T, ConfirmationError>
where
    F: FnMut() -> Option<T>,
{
    for attempt in 0..policy.max_attempts {
        if let Some(value) = check() {
            return Ok(value);
        }
        if attempt + 1 < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    Err(ConfirmationError::TimedOut {
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            interval: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_immediate_success() {
        let result = wait_until(fast_policy(3), || Some(7)).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_success_after_retries() {
        let mut calls = 0;
        let result = wait_until(fast_policy(10), || {
            calls += 1;
            if calls >= 4 {
                Some(calls)
            } else {
                None
            }
        })
        .await;
        assert_eq!(result, Ok(4));
    }

    #[tokio::test]
    async fn test_timeout() {
        let result: Result<(), _> = wait_until(fast_policy(3), || None).await;
        assert_eq!(result, Err(ConfirmationError::TimedOut { attempts: 3 }));
    }
}
