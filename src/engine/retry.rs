//! Bounded-time, bounded-retry wrapper for slide content generation.
//!
//! Each attempt races against a timeout; the losing future is dropped, so a
//! late collaborator result can never be applied to state. A timed-out
//! attempt counts against the retry budget like any other failure.

use std::future::Future;
use std::time::Duration;

use crate::error::EngineError;

/// Maximum content-generation attempts per slide.
pub const MAX_SLIDE_ATTEMPTS: u32 = 3;
/// Time budget for a single attempt.
pub const SLIDE_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);
/// Pause between a failed attempt and the next.
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Retry policy applied to each slide's content generation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_SLIDE_ATTEMPTS,
            attempt_timeout: SLIDE_ATTEMPT_TIMEOUT,
            retry_delay: RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds or the attempt budget is exhausted.
    ///
    /// `on_retry(next_attempt)` fires after a failed attempt, before the
    /// inter-attempt delay, so the caller can surface a retry event. The
    /// final failure is returned without an `on_retry` call.
    pub async fn run<T, F, Fut, L>(&self, mut op: F, mut on_retry: L) -> Result<T, EngineError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, EngineError>>,
        L: FnMut(u32),
    {
        let mut last_err = EngineError::Internal("retry policy ran zero attempts".into());

        for attempt in 1..=self.max_attempts {
            match tokio::time::timeout(self.attempt_timeout, op()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => {
                    tracing::warn!(
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Generation attempt failed",
                    );
                    last_err = e;
                }
                Err(_) => {
                    // The attempt future is dropped here; if the collaborator
                    // call settles later, its result has nowhere to go.
                    let secs = self.attempt_timeout.as_secs();
                    tracing::warn!(
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        timeout_secs = secs,
                        "Generation attempt timed out",
                    );
                    last_err = EngineError::Timeout { secs };
                }
            }

            if attempt < self.max_attempts {
                on_retry(attempt + 1);
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(last_err)
    }
}
