//! Pipeline orchestrator: one full association-and-estimation cycle.
//!
//! # Processing steps per cycle
//! 1. Validate configuration and inputs (fatal before any mutation)
//! 2. Gate every track × report pair (Mahalanobis, shared covariance)
//! 3. Partition candidates into connected clusters (union-find)
//! 4. Per cluster: enumerate hypotheses, score, normalize, marginalize,
//!    select best assignments — clusters are independent and solved in
//!    parallel
//! 5. Apply the Kalman update for each best-assigned report, in report
//!    order, mutating tracks in place
//!
//! Degenerate clusters are skipped with a warning; a failed update affects
//! only its own track. Both partial failures are reported in the output.

use crate::cluster::{build_clusters, Cluster};
use crate::error::AssociationError;
use crate::gating::{GatingEngine, CHI2_95};
use crate::hypothesis::{ExhaustiveGenerator, HypothesisGenerator};
use crate::jpda::{solve_cluster, AssociationWeight, BestAssignment, ClusterSolution};
use crate::kf;
use crate::types::{Candidate, Report, ReportId, StateCov, Track, TrackId};
use rayon::prelude::*;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Configuration for one processing cycle.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Shared measurement-noise covariance R (also the gating covariance Σ).
    pub noise_cov: StateCov,
    /// Mahalanobis gate threshold τ. Default: χ²(0.95, 3).
    pub gate_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            noise_cov: StateCov::identity(),
            gate_threshold: CHI2_95[3],
        }
    }
}

// ---------------------------------------------------------------------------
// Output records
// ---------------------------------------------------------------------------

/// One enumerated hypothesis, in the exported record shape: the owning
/// cluster's track ids with the positionally aligned report assignments
/// (`None` = no detection), plus the two probability fields.
#[derive(Clone, Debug, Serialize)]
pub struct HypothesisRecord {
    pub track_ids: Vec<TrackId>,
    pub report_ids: Vec<Option<ReportId>>,
    pub probability: f64,
    pub joint_probability: f64,
}

/// Everything produced by one cycle.
#[derive(Clone, Debug, Default)]
pub struct CycleOutput {
    /// Gate-passing pairs, track-major order.
    pub candidates: Vec<Candidate>,
    /// Ambiguity clusters, in discovery order.
    pub clusters: Vec<Cluster>,
    /// One record per hypothesis across all solved clusters.
    pub records: Vec<HypothesisRecord>,
    /// Marginal association weights, track-major.
    pub weights: Vec<AssociationWeight>,
    /// Best-supported track per report, for reports that have one.
    pub best_assignments: Vec<BestAssignment>,
    /// Indices into `clusters` that were skipped as degenerate.
    pub skipped_clusters: Vec<usize>,
    /// Tracks whose state update failed; the track keeps its prior.
    pub update_failures: Vec<(TrackId, AssociationError)>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The association pipeline. Owns the gating engine and the hypothesis
/// generator; the track collection is owned by the caller and borrowed
/// exclusively for the duration of one cycle.
pub struct Pipeline {
    config: PipelineConfig,
    engine: GatingEngine,
    generator: Box<dyn HypothesisGenerator>,
}

// The generator is a trait object, so Debug is written out by hand.
impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Create a pipeline, validating the configuration up front.
    pub fn new(config: PipelineConfig) -> Result<Self, AssociationError> {
        Self::with_generator(config, Box::new(ExhaustiveGenerator))
    }

    /// Create a pipeline with a custom hypothesis search strategy.
    pub fn with_generator(
        config: PipelineConfig,
        generator: Box<dyn HypothesisGenerator>,
    ) -> Result<Self, AssociationError> {
        let engine = GatingEngine::new(&config.noise_cov, config.gate_threshold)?;
        Ok(Self {
            config,
            engine,
            generator,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one full cycle. Tracks are mutated in place at the very end;
    /// any configuration error surfaces before the first mutation.
    pub fn process_cycle(
        &self,
        tracks: &mut [Track],
        reports: &[Report],
    ) -> Result<CycleOutput, AssociationError> {
        validate_inputs(tracks, reports)?;

        let candidates = self.engine.candidates(tracks, reports);
        let clusters = build_clusters(&candidates, tracks.len(), reports.len());

        // Clusters touch disjoint track/report sets; solve them in parallel.
        let tracks_ro: &[Track] = tracks;
        let solutions: Vec<Result<ClusterSolution, AssociationError>> = clusters
            .par_iter()
            .map(|cluster| {
                solve_cluster(
                    cluster,
                    tracks_ro,
                    reports,
                    &self.engine,
                    self.generator.as_ref(),
                )
            })
            .collect();

        let mut output = CycleOutput {
            candidates,
            ..CycleOutput::default()
        };
        let mut solved: Vec<(usize, ClusterSolution)> = Vec::with_capacity(clusters.len());

        for (idx, result) in solutions.into_iter().enumerate() {
            match result {
                Ok(solution) => solved.push((idx, solution)),
                Err(err @ AssociationError::DegenerateCluster { .. }) => {
                    tracing::warn!(cluster = idx, %err, "skipping cluster");
                    output.skipped_clusters.push(idx);
                }
                Err(err) => return Err(err),
            }
        }

        for (idx, solution) in &solved {
            let cluster = &clusters[*idx];
            for hyp in &solution.hypotheses {
                output.records.push(HypothesisRecord {
                    track_ids: cluster.track_ids.clone(),
                    report_ids: hyp.assignments.clone(),
                    probability: hyp.probability,
                    joint_probability: hyp.joint_probability,
                });
            }
            output.weights.extend(solution.weights.iter().cloned());
            output.best_assignments.extend(solution.best.iter().cloned());
        }

        // State updates, scoped per track: a singular (P + R) fails that
        // track only and leaves its prior untouched.
        for (_, solution) in &solved {
            for best in &solution.best {
                let track = &mut tracks[best.track.0];
                let z = &reports[best.report.0].position;
                match kf::update(&track.state, &track.cov, z, &self.config.noise_cov) {
                    Ok(res) => {
                        track.state = res.state;
                        track.cov = res.cov;
                    }
                    Err(err) => {
                        tracing::warn!(track = %best.track, report = %best.report, %err,
                            "state update failed, track keeps its prior");
                        output.update_failures.push((best.track, err));
                    }
                }
            }
        }

        output.clusters = clusters;
        Ok(output)
    }
}

/// Reject malformed cycle inputs before anything runs: ids must match the
/// collection indices and every value must be finite.
fn validate_inputs(tracks: &[Track], reports: &[Report]) -> Result<(), AssociationError> {
    for (i, track) in tracks.iter().enumerate() {
        if track.id.0 != i {
            return Err(AssociationError::configuration(format!(
                "track id {} at index {i}",
                track.id.0
            )));
        }
        if track.state.iter().any(|v| !v.is_finite())
            || track.cov.iter().any(|v| !v.is_finite())
        {
            return Err(AssociationError::configuration(format!(
                "track {} has non-finite state or covariance",
                track.id
            )));
        }
    }
    for (j, report) in reports.iter().enumerate() {
        if report.id.0 != j {
            return Err(AssociationError::configuration(format!(
                "report id {} at index {j}",
                report.id.0
            )));
        }
        if report.position.iter().any(|v| !v.is_finite()) {
            return Err(AssociationError::configuration(format!(
                "report {} has non-finite position",
                report.id
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
