//! Fundamental types used across the association pipeline.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Scalar type: f64 throughout for numerical precision in the Kalman update.
// ---------------------------------------------------------------------------

/// Dimension of the shared state / measurement space.
pub const STATE_DIM: usize = 3;

/// 3-DOF state vector: [x, y, z]
pub type StateVec = Vector3<f64>;

/// 3×3 state covariance matrix
pub type StateCov = Matrix3<f64>;

// ---------------------------------------------------------------------------
// Identifier types — newtype wrappers so IDs are never confused at compile time
// ---------------------------------------------------------------------------

/// Index of a track in the caller's track collection.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TrackId(pub usize);

/// Index of a report in the current cycle's report collection.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ReportId(pub usize);

// Labels are 1-based ("t1", "r1") to match the exported record format.
impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0 + 1)
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0 + 1)
    }
}

// ---------------------------------------------------------------------------
// Track / Report
// ---------------------------------------------------------------------------

/// A tracked object. Persists across cycles; its state and covariance are
/// mutated in place by the state updater at the end of each cycle.
#[derive(Clone, Debug)]
pub struct Track {
    pub id: TrackId,
    /// Estimated state vector [x, y, z]
    pub state: StateVec,
    /// State estimation covariance (symmetric, positive semi-definite)
    pub cov: StateCov,
}

impl Track {
    pub fn new(id: TrackId, state: StateVec, cov: StateCov) -> Self {
        Self { id, state, cov }
    }
}

/// A single sensor detection. Lives for one processing cycle, never mutated.
#[derive(Clone, Debug)]
pub struct Report {
    pub id: ReportId,
    /// Measured position [x, y, z]
    pub position: StateVec,
}

impl Report {
    pub fn new(id: ReportId, position: StateVec) -> Self {
        Self { id, position }
    }
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// A (track, report) pair that passed the gate, with its Mahalanobis distance.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub track: TrackId,
    pub report: ReportId,
    /// Mahalanobis distance under the shared measurement covariance
    pub distance: f64,
}
