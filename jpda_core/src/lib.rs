//! `jpda_core` — Joint Probabilistic Data Association for one processing cycle.
//!
//! Associates noisy sensor reports with tracked objects, resolves assignment
//! ambiguity where several tracks compete for overlapping reports, and applies
//! a linear Kalman update to each track's state estimate.
//!
//! # Module layout
//! - [`types`]      — Fundamental types (IDs, state vectors, tracks, reports)
//! - [`error`]      — Error kinds (numerical, degenerate cluster, configuration)
//! - [`gating`]     — Mahalanobis gating against a shared measurement covariance
//! - [`cluster`]    — Connected-component partitioning of the candidate graph
//! - [`hypothesis`] — Assignment hypothesis enumeration
//! - [`jpda`]       — Likelihood scoring, marginal weights, best assignments
//! - [`kf`]         — Identity-observation Kalman update
//! - [`pipeline`]   — Full cycle orchestrator

pub mod cluster;
pub mod error;
pub mod gating;
pub mod hypothesis;
pub mod jpda;
pub mod kf;
pub mod pipeline;
pub mod types;

pub use error::AssociationError;
pub use pipeline::{CycleOutput, HypothesisRecord, Pipeline, PipelineConfig};
pub use types::{Candidate, Report, ReportId, StateCov, StateVec, Track, TrackId};
