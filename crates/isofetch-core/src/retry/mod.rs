//! Retry and backoff policy.
//!
//! Error classification (for diagnostics) and the linear backoff loop shared
//! by the batch orchestrator.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_http_status, ErrorClass};
pub use policy::{InvalidRetryPolicy, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, NextStep, RetryOutcome};
