//! Retry policies for talking to the chain
//!
//! - `LinearBackoff`: `step * attempt` delays
//! - `RetryPolicy`: attempt budget plus backoff, with an async runner
//! - `SubmissionPolicy`: per-failure-class rules for broadcasting

pub mod backoff;
pub mod policy;

pub use backoff::LinearBackoff;
pub use policy::{FailureClass, RetryDecision, RetryError, RetryPolicy, SubmissionPolicy};
