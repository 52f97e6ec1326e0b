//! Sequential batch loop: pace, validate, fetch with retry, record, report.

use serde_json::json;
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::time::Instant;

use crate::control::CancelToken;
use crate::fetch::{FetchError, IsochroneRequest, IsochroneResult, IsochroneSource};
use crate::journal::{LogEntry, LogSink};
use crate::point::{Category, Point};
use crate::retry::{classify, run_with_retry, NextStep, RetryOutcome, RetryPolicy};

use super::outcome::{AttemptOutcome, BatchRun, PointFailure, PointOutcome, RunStatus};
use super::progress::{PointStatus, ProgressEvent};

/// Fixed pause before every point after the first, to stay under the service rate limit.
pub const DEFAULT_INTER_REQUEST_DELAY: Duration = Duration::from_millis(1200);

/// Drives an `IsochroneSource` over a list of points, one at a time.
///
/// Points are never fetched concurrently; the inter-request delay is the
/// rate limiter.
#[derive(Debug)]
pub struct BatchOrchestrator<S> {
    source: Arc<S>,
    policy: RetryPolicy,
    inter_request_delay: Duration,
}

impl<S: IsochroneSource> BatchOrchestrator<S> {
    pub fn new(source: S) -> Self {
        Self::from_arc(Arc::new(source))
    }

    pub fn from_arc(source: Arc<S>) -> Self {
        Self {
            source,
            policy: RetryPolicy::default(),
            inter_request_delay: DEFAULT_INTER_REQUEST_DELAY,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_inter_request_delay(mut self, delay: Duration) -> Self {
        self.inter_request_delay = delay;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inter_request_delay(&self) -> Duration {
        self.inter_request_delay
    }

    /// Runs the batch and returns the finalized `BatchRun`.
    ///
    /// Point failures never abort the batch. `cancel` is checked before each
    /// point and during every wait; once seen, no new point is started.
    /// Progress events go to `progress` (if any) and are never dropped, so
    /// its receiver must be drained concurrently. Diagnostics go to `log`.
    pub async fn run(
        &self,
        points: &[Point],
        range_seconds: NonZeroU32,
        cancel: &CancelToken,
        progress: Option<&Sender<ProgressEvent>>,
        log: &dyn LogSink,
    ) -> BatchRun {
        let total = points.len();
        let mut run = BatchRun::start(total, range_seconds);
        let count = |c: Category| points.iter().filter(|p| p.category == c).count();

        tracing::info!(
            total,
            range_seconds = range_seconds.get(),
            "starting isochrone batch"
        );
        log.append(LogEntry::info(
            "Starting isochrone creation process",
            json!({
                "total_stations": total,
                "metro_stations": count(Category::Metro),
                "tram_stations": count(Category::Tram),
                "monorail_stations": count(Category::Monorail),
                "range_seconds": range_seconds.get(),
                "range_minutes": f64::from(range_seconds.get()) / 60.0,
                "delay_between_requests_ms": self.inter_request_delay.as_millis() as u64,
                "max_attempts": self.policy.max_attempts(),
            }),
        ));

        for (index, point) in points.iter().enumerate() {
            if cancel.is_cancelled() {
                self.log_stop(log, &run, index);
                run.mark_cancelled();
                break;
            }

            let name = point.display_name(index);

            if let Err(e) = point.validate() {
                tracing::warn!(index, station = %name, "skipping invalid station");
                log.append(LogEntry::error(
                    format!("Skipping invalid station at index {}", index),
                    json!({
                        "index": index,
                        "station": name,
                        "reason": e.to_string(),
                    }),
                ));
                run.record(PointOutcome {
                    index,
                    name: name.clone(),
                    point: point.clone(),
                    attempts: 0,
                    outcome: AttemptOutcome::Failure(e.into()),
                });
                emit(progress, &name, index + 1, total, PointStatus::Error).await;
                continue;
            }

            log.append(LogEntry::info(
                format!(
                    "Processing {} station {}/{}: {}",
                    point.category,
                    index + 1,
                    total,
                    name
                ),
                json!({
                    "station_type": point.category,
                    "index": index + 1,
                    "total": total,
                    "station": name,
                    "coordinates": { "lon": point.longitude, "lat": point.latitude },
                    "line_color": point.display_color(),
                }),
            ));

            if index > 0 {
                log.append(LogEntry::info(
                    format!(
                        "Waiting {}ms before next request",
                        self.inter_request_delay.as_millis()
                    ),
                    json!({ "next_station": name }),
                ));
                if cancel.sleep(self.inter_request_delay).await.is_err() {
                    self.log_stop(log, &run, index);
                    run.mark_cancelled();
                    break;
                }
            }

            emit(progress, &name, index + 1, total, PointStatus::Processing).await;

            let request = IsochroneRequest::new(point.clone(), range_seconds);
            let RetryOutcome { result, attempts } =
                self.fetch_with_retry(&request, &name, cancel, log).await;

            let (outcome, status) = match result {
                Ok(result) => {
                    log.append(LogEntry::success(
                        format!("Successfully completed isochrone for {}", name),
                        json!({
                            "station": name,
                            "feature_count": result.features.features.len(),
                            "success_count": run.successes() + 1,
                            "remaining": total - (index + 1),
                        }),
                    ));
                    (AttemptOutcome::Success(result), PointStatus::Success)
                }
                Err(e) => {
                    let class = classify(&e);
                    tracing::warn!(station = %name, error = %e, class = %class, "station failed");
                    log.append(LogEntry::error(
                        format!("Failed to create isochrone for {}", name),
                        json!({
                            "station": name,
                            "coordinates": { "lon": point.longitude, "lat": point.latitude },
                            "error": e.to_string(),
                            "error_type": class.as_str(),
                            "possible_causes": [class.possible_cause()],
                            "suggestions": [class.suggestion()],
                            "fail_count": run.failures() + run.skipped_invalid() + 1,
                        }),
                    ));
                    (
                        AttemptOutcome::Failure(PointFailure::Fetch(e)),
                        PointStatus::Error,
                    )
                }
            };

            run.record(PointOutcome {
                index,
                name: name.clone(),
                point: point.clone(),
                attempts,
                outcome,
            });
            emit(progress, &name, index + 1, total, status).await;
        }

        // A stop requested while the last point was in flight still counts.
        if cancel.is_cancelled() {
            run.mark_cancelled();
        }
        run.finish();

        let (status, count) = match run.status() {
            RunStatus::Finished => (PointStatus::Finished, run.successes()),
            RunStatus::Stopped => (PointStatus::Stopped, run.processed()),
        };
        emit(progress, "", count, total, status).await;
        log.append(summary_entry(&run));
        tracing::info!(
            successes = run.successes(),
            failures = run.failures(),
            skipped = run.skipped_invalid(),
            cancelled = run.is_cancelled(),
            "isochrone batch done"
        );

        run
    }

    /// One point through the retry policy. The same request (and body) is
    /// sent on every attempt.
    async fn fetch_with_retry(
        &self,
        request: &IsochroneRequest,
        name: &str,
        cancel: &CancelToken,
        log: &dyn LogSink,
    ) -> RetryOutcome<IsochroneResult, FetchError> {
        let max_attempts = self.policy.max_attempts();
        let coordinates = json!({
            "lon": request.point.longitude,
            "lat": request.point.latitude,
        });
        let body = request.body_json();

        log.append(LogEntry::info(
            format!("Starting isochrone creation for station: {}", name),
            json!({
                "station": name,
                "coordinates": coordinates,
                "max_attempts": max_attempts,
            }),
        ));

        let on_failure = |attempt: u32, e: &FetchError, step: NextStep| {
            let class = classify(e);
            log.append(LogEntry::retry(
                format!("Attempt {} failed for {}", attempt, name),
                json!({
                    "station": name,
                    "attempt": attempt,
                    "max_attempts": max_attempts,
                    "error_type": class.as_str(),
                    "error_message": e.to_string(),
                    "possible_causes": [class.possible_cause()],
                    "suggestions": [class.suggestion()],
                }),
            ));
            match step {
                NextStep::Retry(delay) => log.append(LogEntry::info(
                    format!(
                        "Waiting {}ms before retry {} for {}",
                        delay.as_millis(),
                        attempt + 1,
                        name
                    ),
                    json!({
                        "station": name,
                        "delay_ms": delay.as_millis() as u64,
                        "next_attempt": attempt + 1,
                    }),
                )),
                NextStep::Exhausted => log.append(LogEntry::error(
                    format!(
                        "Failed to create isochrone for {} after {} attempts",
                        name, attempt
                    ),
                    json!({
                        "station": name,
                        "total_attempts": attempt,
                        "final_error": e.to_string(),
                        "error_type": class.as_str(),
                    }),
                )),
                NextStep::Cancelled => log.append(LogEntry::info(
                    format!("Retry cancelled for {} after attempt {}", name, attempt),
                    json!({ "station": name, "attempt": attempt }),
                )),
            }
        };

        let attempt_once = |attempt: u32| {
            log.append(LogEntry::info(
                format!("Attempt {}/{} for {}", attempt, max_attempts, name),
                json!({
                    "station": name,
                    "attempt": attempt,
                    "max_attempts": max_attempts,
                }),
            ));
            log.append(LogEntry::request(
                format!("API Request for station: {}", name),
                json!({
                    "station": name,
                    "coordinates": coordinates,
                    "request_body": body,
                }),
            ));

            let source = Arc::clone(&self.source);
            let request = request.clone();
            async move {
                let started = Instant::now();
                let result = tokio::task::spawn_blocking(move || source.fetch(&request))
                    .await
                    .map_err(FetchError::from)
                    .and_then(|r| r);
                let duration_ms = started.elapsed().as_millis() as u64;
                match &result {
                    Ok(r) => log.append(LogEntry::response(
                        "API Success - Features received",
                        json!({
                            "station": name,
                            "duration_ms": duration_ms,
                            "feature_count": r.features.features.len(),
                        }),
                    )),
                    Err(e) => log.append(LogEntry::response(
                        "API Error Response",
                        json!({
                            "station": name,
                            "duration_ms": duration_ms,
                            "status": e.status(),
                            "error": e.to_string(),
                        }),
                    )),
                }
                result
            }
        };

        run_with_retry(&self.policy, cancel, on_failure, attempt_once).await
    }

    fn log_stop(&self, log: &dyn LogSink, run: &BatchRun, stopped_at: usize) {
        tracing::info!(stopped_at, "isochrone batch stopped by user");
        log.append(LogEntry::info(
            "Isochrone creation stopped by user",
            json!({
                "stopped_at": stopped_at,
                "total_stations": run.total(),
                "processed_before_stop": run.processed(),
            }),
        ));
    }
}

/// Deliver one status event, waiting for channel capacity. A closed receiver
/// is ignored.
async fn emit(
    progress: Option<&Sender<ProgressEvent>>,
    name: &str,
    current_index: usize,
    total_count: usize,
    status: PointStatus,
) {
    if let Some(tx) = progress {
        let event = ProgressEvent {
            station_name: name.to_string(),
            current_index,
            total_count,
            status,
        };
        if tx.send(event).await.is_err() {
            tracing::debug!(?status, "progress receiver closed");
        }
    }
}

fn rate(n: usize, total: usize) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", n as f64 * 100.0 / total as f64)
}

/// Final journal entry: counts, rates, and failed stations grouped by class.
fn summary_entry(run: &BatchRun) -> LogEntry {
    let total = run.total();
    let failed = run.failures() + run.skipped_invalid();

    let mut by_class: BTreeMap<&'static str, Vec<serde_json::Value>> = BTreeMap::new();
    for (o, failure) in run.failed() {
        let class = failure.class();
        by_class.entry(class.as_str()).or_default().push(json!({
            "name": o.name,
            "coordinates": { "lon": o.point.longitude, "lat": o.point.latitude },
            "error": failure.to_string(),
            "possible_causes": [class.possible_cause()],
            "suggestions": [class.suggestion()],
        }));
    }
    let processed: Vec<&str> = run
        .outcomes()
        .iter()
        .filter(|o| o.outcome.is_success())
        .map(|o| o.name.as_str())
        .collect();

    LogEntry::info(
        "Isochrone creation process completed",
        json!({
            "status": match run.status() {
                RunStatus::Finished => "finished",
                RunStatus::Stopped => "stopped",
            },
            "total_stations": total,
            "success_count": run.successes(),
            "fail_count": failed,
            "skipped_invalid": run.skipped_invalid(),
            "success_rate": rate(run.successes(), total),
            "failed_rate": rate(failed, total),
            "processed_stations": processed,
            "failed_stations": by_class,
        }),
    )
}
