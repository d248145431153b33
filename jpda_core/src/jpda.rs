//! Per-cluster JPDA: hypothesis likelihood scoring, marginal association
//! weights, the joint-probability diagnostic, and best-assignment selection.
//!
//! The raw likelihood of a hypothesis is ∏ exp(−0.5·d²) over its assigned
//! pairs, with d the Mahalanobis distance under the shared measurement
//! covariance (recomputed here, not reused from gating). Scores are
//! normalized within the cluster into a probability distribution, then
//! marginalized into per-(track, report) association weights β.
//!
//! # Known limitations (preserved deliberately)
//! - Best assignment is an independent arg-max per *report*, so one track
//!   can be selected as the best association for several reports at once.
//!   Consumers must not assume a one-to-one assignment.
//! - The joint probability multiplies a hypothesis's probability by the
//!   marginal weights of its own pairs, double-counting evidence. It is a
//!   compatibility output only.

use crate::cluster::Cluster;
use crate::error::AssociationError;
use crate::gating::GatingEngine;
use crate::hypothesis::{Hypothesis, HypothesisGenerator};
use crate::types::{Report, ReportId, Track, TrackId};
use std::collections::BTreeMap;

/// Marginal probability that `track` is associated with `report`, summed
/// over all hypotheses supporting the pairing.
#[derive(Clone, Debug, PartialEq)]
pub struct AssociationWeight {
    pub track: TrackId,
    pub report: ReportId,
    pub weight: f64,
}

/// The best-supported track for one report, chosen by hypothesis
/// probability arg-max within the cluster.
#[derive(Clone, Debug, PartialEq)]
pub struct BestAssignment {
    pub report: ReportId,
    pub track: TrackId,
    pub probability: f64,
}

/// Everything the pipeline needs from one solved cluster.
#[derive(Clone, Debug)]
pub struct ClusterSolution {
    pub hypotheses: Vec<Hypothesis>,
    /// Track-major, report-minor.
    pub weights: Vec<AssociationWeight>,
    /// One entry per cluster report, in ascending report order.
    pub best: Vec<BestAssignment>,
}

/// Enumerate, score, and marginalize one cluster.
///
/// Ids double as slice indices: every `TrackId(i)` in the cluster must
/// satisfy `tracks[i].id == TrackId(i)`, and likewise for reports. The
/// pipeline validates this before clustering; calling directly with
/// out-of-range ids panics.
///
/// Fails with [`AssociationError::DegenerateCluster`] when no hypothesis
/// can be scored (none enumerated, or the likelihood mass vanishes); the
/// caller skips the cluster and continues with the rest.
pub fn solve_cluster(
    cluster: &Cluster,
    tracks: &[Track],
    reports: &[Report],
    engine: &GatingEngine,
    generator: &dyn HypothesisGenerator,
) -> Result<ClusterSolution, AssociationError> {
    let degenerate = |reason: &str| AssociationError::DegenerateCluster {
        tracks: cluster.track_ids.len(),
        reports: cluster.report_ids.len(),
        reason: reason.to_string(),
    };

    let mut hypotheses = generator.enumerate(cluster);
    if hypotheses.is_empty() {
        return Err(degenerate("no valid hypothesis"));
    }

    // Raw likelihoods: ∏ exp(−0.5 d²) over assigned pairs.
    let mut total = 0.0;
    for hyp in &mut hypotheses {
        let mut score = 1.0;
        for (slot, report_id) in hyp.assigned_pairs() {
            let track = &tracks[cluster.track_ids[slot].0];
            let report = &reports[report_id.0];
            let d = engine.distance(&track.state, &report.position);
            score *= (-0.5 * d * d).exp();
        }
        hyp.probability = score;
        total += score;
    }
    if !total.is_finite() {
        return Err(AssociationError::numerical(
            "hypothesis likelihood sum is not finite",
        ));
    }
    if total <= 0.0 {
        // All distances effectively infinite; normalizing would divide by zero.
        return Err(degenerate("zero likelihood mass"));
    }
    for hyp in &mut hypotheses {
        hyp.probability /= total;
    }

    // Marginal weights β(track, report) = Σ P(hypothesis ∋ pair).
    let mut marginals: BTreeMap<(TrackId, ReportId), f64> = BTreeMap::new();
    for hyp in &hypotheses {
        for (slot, report_id) in hyp.assigned_pairs() {
            *marginals
                .entry((cluster.track_ids[slot], report_id))
                .or_insert(0.0) += hyp.probability;
        }
    }

    // Joint-probability diagnostic.
    for hyp in &mut hypotheses {
        let mut joint = hyp.probability;
        for (slot, report_id) in hyp
            .assignments
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.map(|r| (i, r)))
        {
            joint *= marginals[&(cluster.track_ids[slot], report_id)];
        }
        hyp.joint_probability = joint;
    }

    // Best-supported track per report (first strictly-greater wins ties).
    let mut best = Vec::with_capacity(cluster.report_ids.len());
    for &report_id in &cluster.report_ids {
        let mut winner: Option<(TrackId, f64)> = None;
        for hyp in &hypotheses {
            if let Some((slot, _)) = hyp.assigned_pairs().find(|&(_, r)| r == report_id) {
                let better = match winner {
                    Some((_, p)) => hyp.probability > p,
                    None => hyp.probability > 0.0,
                };
                if better {
                    winner = Some((cluster.track_ids[slot], hyp.probability));
                }
            }
        }
        if let Some((track, probability)) = winner {
            best.push(BestAssignment {
                report: report_id,
                track,
                probability,
            });
        }
    }

    let weights = marginals
        .into_iter()
        .map(|((track, report), weight)| AssociationWeight {
            track,
            report,
            weight,
        })
        .collect();

    Ok(ClusterSolution {
        hypotheses,
        weights,
        best,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
