//! Progress events for the status sink (CLI or any UI).
//!
//! The orchestrator sends these over a bounded tokio mpsc channel and waits
//! for capacity, so every event arrives, including the terminal one. The
//! receiver must be drained while the batch runs.

use serde::Serialize;
use std::fmt;

/// Status carried by a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointStatus {
    Processing,
    Success,
    Error,
    Finished,
    Stopped,
}

impl PointStatus {
    /// True for the run-level `Finished` / `Stopped` events.
    pub fn is_terminal(self) -> bool {
        matches!(self, PointStatus::Finished | PointStatus::Stopped)
    }
}

/// One status update.
///
/// For per-point events `current_index` is the 1-based position of the point.
/// For `Finished` it is the success count, for `Stopped` the processed count,
/// and `station_name` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub station_name: String,
    pub current_index: usize,
    pub total_count: usize,
    pub status: PointStatus,
}

impl ProgressEvent {
    /// Fraction of points visited in [0.0, 1.0] (per-point events only).
    pub fn fraction(&self) -> f64 {
        if self.total_count == 0 {
            return 1.0;
        }
        (self.current_index as f64 / self.total_count as f64).min(1.0)
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            PointStatus::Processing => write!(
                f,
                "Creating isochrone: {} ({}/{})",
                self.station_name, self.current_index, self.total_count
            ),
            PointStatus::Success => write!(
                f,
                "Completed: {} ({}/{})",
                self.station_name, self.current_index, self.total_count
            ),
            PointStatus::Error => write!(
                f,
                "Failed: {} ({}/{})",
                self.station_name, self.current_index, self.total_count
            ),
            PointStatus::Finished => write!(
                f,
                "All isochrones completed ({} successful)",
                self.current_index
            ),
            PointStatus::Stopped => write!(
                f,
                "Isochrone creation stopped ({} completed)",
                self.current_index
            ),
        }
    }
}
