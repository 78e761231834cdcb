use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::LinearBackoff;

pub const NONCE_FETCH_ATTEMPTS: u32 = 3;
pub const NONCE_FETCH_STEP: Duration = Duration::from_secs(2);
pub const SUBMIT_ATTEMPTS: u32 = 5;
pub const NONCE_CONFLICT_STEP: Duration = Duration::from_secs(5);
pub const TRANSIENT_STEP: Duration = Duration::from_secs(3);

/// How a failed network call should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// The network rejected the nonce; a fresh one is needed
    NonceConflict,
    /// The account cannot pay; retrying cannot help
    InsufficientFunds,
    /// Anything else, including timeouts
    Transient,
}

impl FailureClass {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FailureClass::InsufficientFunds)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::NonceConflict => "nonce_conflict",
            FailureClass::InsufficientFunds => "insufficient_funds",
            FailureClass::Transient => "transient",
        }
    }
}

#[derive(Debug, Error)]
#[error("{operation} failed after {attempts} attempts: {last_error}")]
pub struct RetryError<E> {
    pub operation: String,
    pub attempts: u32,
    pub last_error: E,
}

/// Fixed attempt budget with linear backoff between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub step: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, step: Duration) -> Self {
        Self { max_attempts, step }
    }

    /// Three attempts, `2s * attempt` apart
    pub const fn nonce_fetch() -> Self {
        Self::new(NONCE_FETCH_ATTEMPTS, NONCE_FETCH_STEP)
    }

    pub fn backoff(&self) -> LinearBackoff {
        LinearBackoff::new(self.step)
    }

    /// Run `op` until it succeeds or the budget is spent
    ///
    /// `op` receives the 1-based attempt number. There is no wait after the
    /// final attempt.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, op: F) -> Result<T, RetryError<E>>
    where
        E: Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_while(operation, |_| true, op).await
    }

    /// Like [`run`](Self::run), but stops at the first error `retryable`
    /// rejects
    pub async fn run_while<T, E, R, F, Fut>(
        &self,
        operation: &str,
        retryable: R,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        E: Display,
        R: Fn(&E) -> bool,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut backoff = self.backoff();
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op(attempt).await {
                Ok(value) => {
                    debug!(operation, attempt, "operation succeeded");
                    return Ok(value);
                }
                Err(e) if !retryable(&e) => {
                    warn!(operation, attempt, error = %e, "permanent failure, not retrying");
                    return Err(RetryError {
                        operation: operation.to_string(),
                        attempts: attempt,
                        last_error: e,
                    });
                }
                Err(e) if attempt >= max_attempts => {
                    warn!(operation, attempt, error = %e, "retries exhausted");
                    return Err(RetryError {
                        operation: operation.to_string(),
                        attempts: attempt,
                        last_error: e,
                    });
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::nonce_fetch()
    }
}

/// What to do after a failed submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Resubmit the same signed transaction after the delay
    RetryAfter(Duration),
    /// Fetch a fresh nonce and re-sign after the delay
    RefreshNonceAfter(Duration),
    GiveUp,
}

/// Classification-driven retry rules for transaction submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionPolicy {
    pub max_attempts: u32,
    pub nonce_conflict_step: Duration,
    pub transient_step: Duration,
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self {
            max_attempts: SUBMIT_ATTEMPTS,
            nonce_conflict_step: NONCE_CONFLICT_STEP,
            transient_step: TRANSIENT_STEP,
        }
    }
}

impl SubmissionPolicy {
    /// Decision after the given 1-based attempt failed with `class`
    pub fn decide(&self, class: FailureClass, attempt: u32) -> RetryDecision {
        if !class.is_retryable() || attempt >= self.max_attempts.max(1) {
            return RetryDecision::GiveUp;
        }
        match class {
            FailureClass::NonceConflict => {
                RetryDecision::RefreshNonceAfter(self.nonce_conflict_step.saturating_mul(attempt))
            }
            _ => RetryDecision::RetryAfter(self.transient_step.saturating_mul(attempt)),
        }
    }
}
