//! Scan progress snapshots.

use serde::Serialize;

/// A point-in-time view of a recursive scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanProgress {
    /// Packages fully loaded so far.
    pub completed: usize,
    /// Packages discovered. Fixed before any worker starts.
    pub total: usize,
    /// Package being dispatched, empty on the final report.
    pub current: String,
    /// `completed / total` as a percentage.
    pub percentage: f64,
}

impl ScanProgress {
    pub fn new(completed: usize, total: usize, current: impl Into<String>) -> Self {
        let percentage = if total == 0 {
            100.0
        } else {
            completed as f64 * 100.0 / total as f64
        };
        Self {
            completed,
            total,
            current: current.into(),
            percentage,
        }
    }

    /// Whether every discovered package has been loaded.
    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}
