//! Mahalanobis gating: determines whether a report is "close enough" to a
//! track's predicted position to be considered as a potential association.
//!
//! # Gating criterion
//! d(x, z) = sqrt(δᵀ Σ⁻¹ δ)  where δ = x − z
//!
//! Accept if d < τ, where τ is the χ² quantile at the chosen confidence
//! level for `STATE_DIM` degrees of freedom (0.95 → τ ≈ 7.8147 for 3 dof).
//! The raw quantile gates the distance itself, not the squared distance,
//! so the gate is wider than a textbook χ² gate; downstream consumers
//! depend on the resulting candidate sets, so this stays as-is.
//!
//! A single shared measurement covariance Σ is used for every (track,
//! report) pair, rather than each track's innovation covariance P + R.
//! Deliberate simplification: gate width does not adapt to track
//! uncertainty.

use crate::error::AssociationError;
use crate::types::{Candidate, Report, StateCov, StateVec, Track};

/// Pre-computed χ² gate thresholds indexed by dimension [1..=6].
/// Value at index `d` is χ²(0.95, d).
pub const CHI2_95: [f64; 7] = [0.0, 3.8415, 5.9915, 7.8147, 9.4877, 11.0705, 12.5916];

/// Gating engine: holds the shared inverse measurement covariance and the
/// gate threshold for one processing cycle.
#[derive(Clone, Debug)]
pub struct GatingEngine {
    cov_inv: StateCov,
    threshold: f64,
}

impl GatingEngine {
    /// Build an engine from the shared measurement covariance Σ and a gate
    /// threshold τ. Fails with a configuration error if Σ is singular,
    /// contains non-finite entries, or τ is not a positive finite number.
    pub fn new(noise_cov: &StateCov, threshold: f64) -> Result<Self, AssociationError> {
        if noise_cov.iter().any(|v| !v.is_finite()) {
            return Err(AssociationError::configuration(
                "measurement covariance contains non-finite entries",
            ));
        }
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(AssociationError::configuration(format!(
                "gate threshold must be positive and finite, got {threshold}"
            )));
        }
        let cov_inv = noise_cov.try_inverse().ok_or_else(|| {
            AssociationError::configuration("measurement covariance is singular")
        })?;
        Ok(Self { cov_inv, threshold })
    }

    /// Build an engine from a confidence level and a caller-supplied χ²
    /// quantile function `quantile(level, dof)`.
    pub fn from_confidence(
        noise_cov: &StateCov,
        confidence: f64,
        quantile: impl Fn(f64, usize) -> f64,
    ) -> Result<Self, AssociationError> {
        if !(0.0..1.0).contains(&confidence) {
            return Err(AssociationError::configuration(format!(
                "confidence level must be in (0, 1), got {confidence}"
            )));
        }
        Self::new(noise_cov, quantile(confidence, crate::types::STATE_DIM))
    }

    /// Gate threshold τ.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Mahalanobis distance between a track state and a report position
    /// under the shared inverse covariance.
    pub fn distance(&self, state: &StateVec, position: &StateVec) -> f64 {
        let delta = state - position;
        delta.dot(&(self.cov_inv * delta)).sqrt()
    }

    /// Compute all admissible (track, report) candidates.
    /// Output order is track-major, report-minor, and stable.
    pub fn candidates(&self, tracks: &[Track], reports: &[Report]) -> Vec<Candidate> {
        let mut out = Vec::new();
        for track in tracks {
            for report in reports {
                let d = self.distance(&track.state, &report.position);
                if d < self.threshold {
                    out.push(Candidate {
                        track: track.id,
                        report: report.id,
                        distance: d,
                    });
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ReportId, TrackId};
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    fn canonical_tracks() -> Vec<Track> {
        [[6.0, 6.0, 10.0], [15.0, 15.0, 10.0], [7.0, 7.0, 10.0]]
            .iter()
            .enumerate()
            .map(|(i, p)| Track::new(TrackId(i), Vector3::from_column_slice(p), StateCov::identity()))
            .collect()
    }

    fn canonical_reports() -> Vec<Report> {
        [
            [7.0, 7.0, 10.0],
            [16.0, 16.0, 10.0],
            [8.0, 8.0, 10.0],
            [80.0, 80.0, 80.0],
        ]
        .iter()
        .enumerate()
        .map(|(j, p)| Report::new(ReportId(j), Vector3::from_column_slice(p)))
        .collect()
    }

    #[test]
    fn identity_covariance_distances() {
        let engine = GatingEngine::new(&StateCov::identity(), CHI2_95[3]).unwrap();
        let tracks = canonical_tracks();
        let reports = canonical_reports();
        // t1–r1 differs by (−1, −1, 0) → √2
        let d = engine.distance(&tracks[0].state, &reports[0].position);
        assert_abs_diff_eq!(d, 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn canonical_candidates_track_major() {
        let engine = GatingEngine::new(&StateCov::identity(), CHI2_95[3]).unwrap();
        let cands = engine.candidates(&canonical_tracks(), &canonical_reports());

        let pairs: Vec<(usize, usize)> = cands.iter().map(|c| (c.track.0, c.report.0)).collect();
        assert_eq!(pairs, vec![(0, 0), (0, 2), (1, 1), (2, 0), (2, 2)]);
        // The far-away report r4 admits no candidate at all.
        assert!(cands.iter().all(|c| c.report.0 != 3));

        let sqrt2 = 2.0_f64.sqrt();
        let expected = [sqrt2, 2.0 * sqrt2, sqrt2, 0.0, sqrt2];
        for (c, want) in cands.iter().zip(expected) {
            assert_abs_diff_eq!(c.distance, want, epsilon = 1e-12);
        }
    }

    #[test]
    fn singular_covariance_rejected() {
        let singular = StateCov::zeros();
        let err = GatingEngine::new(&singular, CHI2_95[3]).unwrap_err();
        assert!(matches!(err, AssociationError::Configuration { .. }));
    }

    #[test]
    fn from_confidence_uses_supplied_quantile() {
        let engine =
            GatingEngine::from_confidence(&StateCov::identity(), 0.95, |_, dof| CHI2_95[dof])
                .unwrap();
        assert_abs_diff_eq!(engine.threshold(), 7.8147, epsilon = 1e-9);
    }

    #[test]
    fn gating_is_idempotent() {
        let engine = GatingEngine::new(&StateCov::identity(), CHI2_95[3]).unwrap();
        let tracks = canonical_tracks();
        let reports = canonical_reports();
        let a = engine.candidates(&tracks, &reports);
        let b = engine.candidates(&tracks, &reports);
        assert_eq!(a, b);
    }
}
