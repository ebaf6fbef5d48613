//! Per-attempt deadline and cancellation
//!
//! Wraps exactly one network attempt with a timer. When the timer wins the
//! attempt's cancellation token is cancelled and the attempt resolves to a
//! 408 timeout error.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::http::error::ApiError;

/// Run one attempt under a deadline.
///
/// `attempt` receives a fresh token that fires when the deadline expires or
/// when the caller's `external` token is cancelled. The timer lives only as
/// long as this call, so it is released on every exit path. An already
/// cancelled `external` token fails fast without invoking `attempt`.
pub async fn with_deadline<F, Fut, T>(
    timeout: Duration,
    external: Option<&CancellationToken>,
    attempt: F,
) -> Result<T, ApiError>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    if external.is_some_and(CancellationToken::is_cancelled) {
        debug!("attempt cancelled by caller before dispatch");
        return Err(ApiError::cancelled());
    }

    let token = match external {
        Some(parent) => parent.child_token(),
        None => CancellationToken::new(),
    };

    let timer = tokio::time::sleep(timeout);
    let attempt = attempt(token.clone());
    tokio::pin!(timer);
    tokio::pin!(attempt);

    tokio::select! {
        biased;
        result = &mut attempt => result,
        _ = &mut timer => {
            token.cancel();
            debug!(timeout_ms = timeout.as_millis() as u64, "attempt deadline expired");
            Err(ApiError::timeout())
        }
        _ = external_cancelled(external) => {
            token.cancel();
            debug!("attempt cancelled by caller");
            Err(ApiError::cancelled())
        }
    }
}

async fn external_cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}
