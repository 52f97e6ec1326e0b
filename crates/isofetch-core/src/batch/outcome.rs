//! Per-point outcomes and the aggregate `BatchRun`.

use chrono::{DateTime, Utc};
use std::num::NonZeroU32;

use crate::fetch::{FetchError, IsochroneResult};
use crate::point::{Point, ValidationError};
use crate::retry::{classify, ErrorClass};

/// Why a point has no polygons.
#[derive(Debug, thiserror::Error)]
pub enum PointFailure {
    /// Rejected before any network attempt.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Last error after retries were exhausted (or cut short by cancellation).
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl PointFailure {
    /// Diagnostic class of the failure.
    pub fn class(&self) -> ErrorClass {
        match self {
            PointFailure::Validation(_) => ErrorClass::Validation,
            PointFailure::Fetch(e) => classify(e),
        }
    }
}

/// Result of processing one point. Never both.
#[derive(Debug)]
pub enum AttemptOutcome {
    Success(IsochroneResult),
    Failure(PointFailure),
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success(_))
    }

    pub fn failure(&self) -> Option<&PointFailure> {
        match self {
            AttemptOutcome::Failure(f) => Some(f),
            AttemptOutcome::Success(_) => None,
        }
    }
}

/// One recorded point, in input order.
#[derive(Debug)]
pub struct PointOutcome {
    /// 0-based index in the input list.
    pub index: usize,
    pub name: String,
    pub point: Point,
    /// Network attempts made (0 for invalid points).
    pub attempts: u32,
    pub outcome: AttemptOutcome,
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every point was visited.
    Finished,
    /// Cancelled; remaining points were not started.
    Stopped,
}

/// One execution of the orchestrator across a list of points.
///
/// `processed() == successes() + failures()` holds at all times; invalid
/// points are counted by `skipped_invalid()` instead.
#[derive(Debug)]
pub struct BatchRun {
    outcomes: Vec<PointOutcome>,
    total: usize,
    range_seconds: NonZeroU32,
    cancelled: bool,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl BatchRun {
    pub(crate) fn start(total: usize, range_seconds: NonZeroU32) -> Self {
        Self {
            outcomes: Vec::with_capacity(total),
            total,
            range_seconds,
            cancelled: false,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub(crate) fn record(&mut self, outcome: PointOutcome) {
        debug_assert!(self.finished_at.is_none(), "record after finish");
        self.outcomes.push(outcome);
    }

    pub(crate) fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub(crate) fn finish(&mut self) {
        if self.finished_at.is_none() {
            self.finished_at = Some(Utc::now());
        }
    }

    pub fn outcomes(&self) -> &[PointOutcome] {
        &self.outcomes
    }

    /// Number of points handed to the run.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn range_seconds(&self) -> NonZeroU32 {
        self.range_seconds
    }

    pub fn successes(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_success()).count()
    }

    /// Points that reached the network stage and failed.
    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, AttemptOutcome::Failure(PointFailure::Fetch(_))))
            .count()
    }

    /// Points rejected by validation (no network attempt).
    pub fn skipped_invalid(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o.outcome,
                    AttemptOutcome::Failure(PointFailure::Validation(_))
                )
            })
            .count()
    }

    /// Points that reached the network stage (`successes + failures`).
    pub fn processed(&self) -> usize {
        self.successes() + self.failures()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn status(&self) -> RunStatus {
        if self.cancelled {
            RunStatus::Stopped
        } else {
            RunStatus::Finished
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// End timestamp; `None` while the loop is still running.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn is_finalized(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Successful results in input order.
    pub fn results(&self) -> impl Iterator<Item = &IsochroneResult> {
        self.outcomes.iter().filter_map(|o| match &o.outcome {
            AttemptOutcome::Success(r) => Some(r),
            AttemptOutcome::Failure(_) => None,
        })
    }

    /// Failed points (fetch and validation) in input order.
    pub fn failed(&self) -> impl Iterator<Item = (&PointOutcome, &PointFailure)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.outcome.failure().map(|f| (o, f)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{Feature, FeatureCollection, IsochroneRequest};
    use crate::point::Category;

    fn range() -> NonZeroU32 {
        NonZeroU32::new(600).unwrap()
    }

    fn outcome(index: usize, outcome: AttemptOutcome) -> PointOutcome {
        PointOutcome {
            index,
            name: format!("S{index}"),
            point: Point::new(index as f64, 0.0, Category::Metro),
            attempts: 1,
            outcome,
        }
    }

    fn success(index: usize) -> AttemptOutcome {
        let req = IsochroneRequest::new(Point::new(index as f64, 0.0, Category::Metro), range());
        let feature = Feature {
            kind: "Feature".to_string(),
            geometry: serde_json::Value::Null,
            properties: None,
        };
        AttemptOutcome::Success(IsochroneResult::new(&req, FeatureCollection::new(vec![feature])))
    }

    #[test]
    fn counts_split_fetch_failures_and_invalid_points() {
        let mut run = BatchRun::start(4, range());
        run.record(outcome(0, success(0)));
        run.record(outcome(
            1,
            AttemptOutcome::Failure(FetchError::Http { status: 500, body: String::new() }.into()),
        ));
        run.record(outcome(
            2,
            AttemptOutcome::Failure(
                ValidationError {
                    longitude: f64::NAN,
                    latitude: 0.0,
                }
                .into(),
            ),
        ));
        run.record(outcome(3, success(3)));
        run.finish();

        assert_eq!(run.successes(), 2);
        assert_eq!(run.failures(), 1);
        assert_eq!(run.skipped_invalid(), 1);
        assert_eq!(run.processed(), run.successes() + run.failures());
        assert_eq!(run.processed() + run.skipped_invalid(), run.total());
        assert_eq!(run.results().count(), 2);
        let classes: Vec<_> = run.failed().map(|(_, f)| f.class()).collect();
        assert_eq!(classes, vec![ErrorClass::ServerError, ErrorClass::Validation]);
        assert_eq!(run.status(), RunStatus::Finished);
    }

    #[test]
    fn cancellation_is_sticky_and_finish_sets_end_once() {
        let mut run = BatchRun::start(1, range());
        assert!(!run.is_finalized());
        run.mark_cancelled();
        run.finish();
        let end = run.finished_at();
        assert!(end.is_some());
        run.finish();
        assert_eq!(run.finished_at(), end);
        assert!(run.is_cancelled());
        assert_eq!(run.status(), RunStatus::Stopped);
        assert!(run.finished_at().unwrap() >= run.started_at());
    }
}
