//! Batch orchestrator.
//!
//! Walks a list of points strictly in order: validate → pace → fetch with
//! retry → record → report progress. Point failures are recorded and the
//! loop moves on; the only early exit is cancellation.

mod outcome;
mod progress;
mod run;

pub use outcome::{AttemptOutcome, BatchRun, PointFailure, PointOutcome, RunStatus};
pub use progress::{PointStatus, ProgressEvent};
pub use run::{BatchOrchestrator, DEFAULT_INTER_REQUEST_DELAY};
