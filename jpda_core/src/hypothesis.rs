//! Assignment hypothesis enumeration for one cluster.
//!
//! A hypothesis assigns every cluster track either one cluster report or
//! "no detection", with no report claimed twice and at least one track
//! detected. Enumeration spans the full Cartesian space of size (n+1)^m —
//! a track may be hypothetically paired with any report in its cluster,
//! not only the reports it individually gated with; scoring penalises
//! distant pairs naturally.
//!
//! # Scalability
//! The exhaustive generator visits every point of the (n+1)^m raw space and
//! is intended for clusters where that stays below ~10⁵–10⁶ (roughly
//! m, n ≤ 8–10). Larger clusters need a bounded best-k assignment search
//! such as Murty's algorithm — an extension point behind
//! [`HypothesisGenerator`], not implemented here. Oversized clusters are
//! skipped with a warning rather than enumerated.

use crate::cluster::Cluster;
use crate::types::ReportId;

/// Largest raw assignment space the exhaustive generator will enumerate.
const RAW_SPACE_LIMIT: u128 = 1_000_000;

/// One complete, non-conflicting assignment of cluster tracks to reports.
///
/// `assignments[i]` belongs to `cluster.track_ids[i]`; `None` means the
/// track went undetected in this hypothesis.
#[derive(Clone, Debug, PartialEq)]
pub struct Hypothesis {
    pub assignments: Vec<Option<ReportId>>,
    /// Probability normalized within the owning cluster.
    pub probability: f64,
    /// Diagnostic product of the hypothesis probability and its pairs'
    /// marginal weights. Not a standard statistical quantity; retained
    /// for output compatibility.
    pub joint_probability: f64,
}

impl Hypothesis {
    pub fn new(assignments: Vec<Option<ReportId>>) -> Self {
        Self {
            assignments,
            probability: 0.0,
            joint_probability: 0.0,
        }
    }

    /// Iterate the (track slot, report) pairs actually assigned.
    pub fn assigned_pairs(&self) -> impl Iterator<Item = (usize, ReportId)> + '_ {
        self.assignments
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.map(|r| (i, r)))
    }
}

/// Capability: produce the finite set of valid hypotheses for a cluster.
pub trait HypothesisGenerator: Send + Sync {
    fn enumerate(&self, cluster: &Cluster) -> Vec<Hypothesis>;
}

/// Exhaustive generate-and-filter enumeration over the mixed-radix counter
/// in base (n+1): digit i selects the assignment for track slot i, with
/// digit value 0 meaning "no detection".
#[derive(Clone, Copy, Debug, Default)]
pub struct ExhaustiveGenerator;

impl HypothesisGenerator for ExhaustiveGenerator {
    fn enumerate(&self, cluster: &Cluster) -> Vec<Hypothesis> {
        let m = cluster.track_ids.len();
        let n = cluster.report_ids.len();
        if m == 0 {
            return Vec::new();
        }

        let base = (n + 1) as u128;
        let total = match base.checked_pow(m as u32) {
            Some(t) if t <= RAW_SPACE_LIMIT => t,
            _ => {
                tracing::warn!(
                    tracks = m,
                    reports = n,
                    "cluster exceeds exhaustive enumeration bound, skipping"
                );
                return Vec::new();
            }
        };

        let mut out = Vec::new();
        for count in 0..total {
            let mut digits = count;
            let mut assignments = Vec::with_capacity(m);
            for _ in 0..m {
                let d = (digits % base) as usize;
                digits /= base;
                assignments.push(if d == 0 {
                    None
                } else {
                    Some(cluster.report_ids[d - 1])
                });
            }
            if is_valid(&assignments) {
                out.push(Hypothesis::new(assignments));
            }
        }
        out
    }
}

/// Valid iff no report is claimed twice and at least one track is detected.
fn is_valid(assignments: &[Option<ReportId>]) -> bool {
    let mut seen: Vec<ReportId> = Vec::with_capacity(assignments.len());
    for r in assignments.iter().flatten() {
        if seen.contains(r) {
            return false;
        }
        seen.push(*r);
    }
    !seen.is_empty()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Candidate, TrackId};

    fn cluster(tracks: &[usize], reports: &[usize]) -> Cluster {
        Cluster {
            track_ids: tracks.iter().map(|&t| TrackId(t)).collect(),
            report_ids: reports.iter().map(|&r| ReportId(r)).collect(),
            candidates: tracks
                .iter()
                .zip(reports)
                .map(|(&t, &r)| Candidate {
                    track: TrackId(t),
                    report: ReportId(r),
                    distance: 1.0,
                })
                .collect(),
        }
    }

    #[test]
    fn two_by_two_yields_six_valid() {
        // Raw space 3² = 9; minus the all-miss combination and the two
        // double-claims (r,r) leaves 6.
        let hyps = ExhaustiveGenerator.enumerate(&cluster(&[0, 2], &[0, 2]));
        assert_eq!(hyps.len(), 6);
        for h in &hyps {
            assert!(h.assigned_pairs().count() >= 1);
            let claimed: Vec<_> = h.assigned_pairs().map(|(_, r)| r).collect();
            let mut dedup = claimed.clone();
            dedup.dedup();
            assert_eq!(claimed, dedup, "report claimed twice in {h:?}");
        }
    }

    #[test]
    fn single_pair_cluster() {
        let hyps = ExhaustiveGenerator.enumerate(&cluster(&[1], &[1]));
        assert_eq!(hyps.len(), 1);
        assert_eq!(hyps[0].assignments, vec![Some(ReportId(1))]);
    }

    #[test]
    fn more_tracks_than_reports_still_enumerates() {
        // Two tracks competing for one report: the loser goes undetected.
        let hyps = ExhaustiveGenerator.enumerate(&cluster(&[0, 1], &[0]));
        assert_eq!(hyps.len(), 2);
        assert!(hyps
            .iter()
            .any(|h| h.assignments == vec![Some(ReportId(0)), None]));
        assert!(hyps
            .iter()
            .any(|h| h.assignments == vec![None, Some(ReportId(0))]));
    }

    #[test]
    fn raw_space_size_matches_formula() {
        // m = 3, n = 2 → raw 27; valid = hypotheses with distinct claims
        // and at least one detection.
        let hyps = ExhaustiveGenerator.enumerate(&cluster(&[0, 1, 2], &[0, 1]));
        // Count directly: choose a non-empty subset of tracks to detect and
        // an injective mapping onto the 2 reports: 3*2 (one detected, 2
        // report choices) + 3*2 (two detected, ordered) = 12.
        assert_eq!(hyps.len(), 12);
    }

    #[test]
    fn oversized_cluster_is_skipped() {
        let tracks: Vec<usize> = (0..12).collect();
        let reports: Vec<usize> = (0..12).collect();
        let hyps = ExhaustiveGenerator.enumerate(&cluster(&tracks, &reports));
        assert!(hyps.is_empty());
    }

    #[test]
    fn empty_cluster_yields_nothing() {
        let hyps = ExhaustiveGenerator.enumerate(&cluster(&[], &[]));
        assert!(hyps.is_empty());
    }
}
