//! Fixed-interval retry and status polling.
//!
//! Every API call is wrapped in [`retry`], which repeats the call while the
//! error is retryable and the time budget lasts. Asynchronous operations use
//! [`poll_until`] on a status endpoint. Both stop early when the request
//! context is cancelled.

use std::future::Future;
use std::time::{Duration, Instant};

use tfplug::Context;

use super::error::ApiError;

pub const READ_RETRY_TIMEOUT: Duration = Duration::from_secs(3 * 60);
pub const WRITE_RETRY_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Pause between attempts of a failed call
    pub interval: Duration,
    /// Pause between status checks of an asynchronous operation
    pub poll_interval: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_RETRY_INTERVAL,
            poll_interval: DEFAULT_POLL_INTERVAL,
            read_timeout: READ_RETRY_TIMEOUT,
            write_timeout: WRITE_RETRY_TIMEOUT,
        }
    }
}

impl RetryConfig {
    /// Millisecond intervals and second-scale budgets, for tests against mocks.
    pub fn fast() -> Self {
        Self {
            interval: Duration::from_millis(5),
            poll_interval: Duration::from_millis(5),
            read_timeout: Duration::from_secs(2),
            write_timeout: Duration::from_secs(2),
        }
    }
}

/// Outcome of one status check.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus<T> {
    Done(T),
    Pending(String),
    Failed(String),
}

/// Call `op` until it succeeds, fails with a non-retryable error or the
/// timeout elapses. A timeout carries the last error seen.
pub async fn retry<T, F, Fut>(
    ctx: &Context,
    timeout: Duration,
    interval: Duration,
    mut op: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let start = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => err,
        };

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(ApiError::Timeout {
                elapsed,
                last: err.to_string(),
            });
        }

        tracing::debug!(attempt, error = %err, "retryable error, trying again in {:?}", interval);
        pause(ctx, interval.min(timeout - elapsed)).await?;
    }
}

/// Run `check` until it reports `Done` or `Failed`, or the timeout elapses.
/// Retryable errors from `check` count as pending.
pub async fn poll_until<T, F, Fut>(
    ctx: &Context,
    timeout: Duration,
    interval: Duration,
    mut check: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollStatus<T>, ApiError>>,
{
    let start = Instant::now();

    loop {
        let last = match check().await {
            Ok(PollStatus::Done(value)) => return Ok(value),
            Ok(PollStatus::Failed(reason)) => return Err(ApiError::Failed(reason)),
            Ok(PollStatus::Pending(reason)) => reason,
            Err(err) if err.is_retryable() => err.to_string(),
            Err(err) => return Err(err),
        };

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(ApiError::Timeout { elapsed, last });
        }

        tracing::debug!(status = %last, "still waiting after {:?}", elapsed);
        pause(ctx, interval.min(timeout - elapsed)).await?;
    }
}

async fn pause(ctx: &Context, duration: Duration) -> Result<(), ApiError> {
    if ctx.is_cancelled() {
        return Err(ApiError::Cancelled);
    }
    tokio::select! {
        _ = ctx.done() => Err(ApiError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}
