//! Retry coordination for API calls
//!
//! Drives sequential attempts of one logical call. Only network failures and
//! deadline expiries are retried, with a fixed delay between attempts.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::http::error::ApiError;

/// Retry policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; 0 means a single attempt
    pub max_retries: u32,
    /// Fixed pause between attempts
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Exactly one attempt
    pub fn none() -> Self {
        Self::new(0)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Decision on what to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait `delay`, then try again
    Retry { delay: Duration },
    /// Surface the error now
    Fatal,
}

/// Per-call attempt bookkeeping, dropped when the call resolves
#[derive(Debug)]
pub struct AttemptState {
    policy: RetryPolicy,
    attempts_remaining: u32,
    attempts_made: u32,
    last_error: Option<ApiError>,
}

impl AttemptState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts_remaining: policy.max_retries,
            attempts_made: 0,
            last_error: None,
        }
    }

    /// Record a failed attempt and decide the next transition
    pub fn on_failure(&mut self, error: ApiError) -> RetryDecision {
        self.attempts_made += 1;
        let retryable = error.is_retryable();
        self.last_error = Some(error);

        if !retryable || self.attempts_remaining == 0 {
            return RetryDecision::Fatal;
        }

        self.attempts_remaining -= 1;
        RetryDecision::Retry {
            delay: self.policy.retry_delay,
        }
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    pub fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    fn into_last_error(self) -> Option<ApiError> {
        self.last_error
    }
}

/// Run `attempt_fn` until it succeeds, fails fatally or runs out of retries.
///
/// Attempts are strictly sequential: attempt `n + 1` is only created after
/// attempt `n` has settled. The closure receives the 1-based attempt number.
/// Once `cancel` fires no further attempt is started and any pending retry
/// delay ends early with a cancellation error.
pub async fn execute_with_retry<F, Fut, T>(
    policy: RetryPolicy,
    cancel: Option<&CancellationToken>,
    mut attempt_fn: F,
) -> Result<T, ApiError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut state = AttemptState::new(policy);

    loop {
        let attempt = state.attempts_made() + 1;
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            debug!(attempt, "call cancelled before attempt");
            return Err(ApiError::cancelled());
        }

        let failure = match attempt_fn(attempt).await {
            Ok(value) => return Ok(value),
            Err(failure) => failure,
        };

        let status = failure.status;
        match state.on_failure(failure) {
            RetryDecision::Retry { delay } => {
                warn!(
                    attempt,
                    status,
                    attempts_remaining = state.attempts_remaining(),
                    delay_ms = delay.as_millis() as u64,
                    "transient failure, retrying"
                );
                if !wait_for_retry(delay, cancel).await {
                    debug!(attempt, "call cancelled during retry delay");
                    return Err(ApiError::cancelled());
                }
            }
            RetryDecision::Fatal => {
                let err = state
                    .into_last_error()
                    .unwrap_or_else(|| ApiError::network("Request failed"));
                if err.is_retryable() {
                    error!(
                        attempts = attempt,
                        status, "request failed after exhausting retries: {}", err
                    );
                } else {
                    debug!(attempt, status, "request failed without retry: {}", err);
                }
                return Err(err);
            }
        }
    }
}

/// Sleep for `delay`; false when `cancel` fires first
async fn wait_for_retry(delay: Duration, cancel: Option<&CancellationToken>) -> bool {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        },
        None => {
            tokio::time::sleep(delay).await;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::error::ErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries).with_delay(Duration::from_millis(1))
    }

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.retry_delay, Duration::from_millis(1000));
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(RetryPolicy::none().max_attempts(), 1);
    }

    #[test]
    fn test_attempt_state_transitions() {
        let mut state = AttemptState::new(RetryPolicy::new(2));

        assert!(matches!(state.on_failure(ApiError::timeout()), RetryDecision::Retry { .. }));
        assert_eq!(state.attempts_remaining(), 1);
        assert!(matches!(
            state.on_failure(ApiError::network("reset")),
            RetryDecision::Retry { .. }
        ));
        assert_eq!(state.attempts_remaining(), 0);
        assert_eq!(state.on_failure(ApiError::timeout()), RetryDecision::Fatal);
        assert_eq!(state.attempts_made(), 3);
        assert_eq!(state.last_error().map(|e| e.status), Some(408));
    }

    #[test]
    fn test_structured_failures_are_fatal() {
        let mut state = AttemptState::new(RetryPolicy::new(3));
        let decision =
            state.on_failure(ApiError::from_response(500, "Internal Server Error", None));
        assert_eq!(decision, RetryDecision::Fatal);
        assert_eq!(state.attempts_remaining(), 3);

        let mut state = AttemptState::new(RetryPolicy::new(3));
        assert_eq!(state.on_failure(ApiError::cancelled()), RetryDecision::Fatal);
    }

    #[test]
    fn test_fixed_delay() {
        let mut state =
            AttemptState::new(RetryPolicy::new(3).with_delay(Duration::from_millis(250)));
        for _ in 0..3 {
            assert_eq!(
                state.on_failure(ApiError::network("down")),
                RetryDecision::Retry {
                    delay: Duration::from_millis(250)
                }
            );
        }
    }

    #[tokio::test]
    async fn test_retry_bound() {
        for max_retries in [0u32, 1, 3] {
            let calls = Arc::new(AtomicU32::new(0));
            let counter = calls.clone();

            let result: Result<(), ApiError> = execute_with_retry(fast(max_retries), None, |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ApiError::network("connection refused"))
                }
            })
            .await;

            let err = result.unwrap_err();
            assert_eq!(err.status, 0);
            assert_eq!(calls.load(Ordering::SeqCst), max_retries + 1);
        }
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let result = execute_with_retry(fast(2), None, |attempt| async move {
            if attempt < 3 {
                Err(ApiError::timeout())
            } else {
                Ok(attempt)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_no_retry_on_structured_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), ApiError> = execute_with_retry(fast(3), None, |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::from_response(422, "Validation failed", None))
            }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.status, 422);
        assert_eq!(err.kind, ErrorKind::Response);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_last_error_is_surfaced() {
        let result: Result<(), ApiError> = execute_with_retry(fast(1), None, |attempt| async move {
            if attempt == 1 {
                Err(ApiError::network("first"))
            } else {
                Err(ApiError::timeout())
            }
        })
        .await;
        assert_eq!(result.unwrap_err().kind, ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_cancel_during_delay_stops_retrying() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let policy = RetryPolicy::new(3).with_delay(Duration::from_millis(300));
        let started = std::time::Instant::now();
        let result = execute_with_retry(policy, Some(&cancel), |attempt| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if attempt == 1 {
                    Err(ApiError::network("connection reset"))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Cancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_millis(300), "took {:?}", started.elapsed());
    }

    #[tokio::test]
    async fn test_cancelled_call_starts_no_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<(), ApiError> = execute_with_retry(fast(2), Some(&cancel), |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;

        assert_eq!(result.unwrap_err().kind, ErrorKind::Cancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
