//! Error kinds for the association pipeline.
//!
//! Propagation policy:
//! - [`AssociationError::Configuration`] is fatal for the whole cycle and is
//!   surfaced before any track is mutated.
//! - [`AssociationError::DegenerateCluster`] skips only the offending
//!   cluster; other clusters proceed.
//! - [`AssociationError::Numerical`] raised during a state update is scoped
//!   to the single track being updated.

use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum AssociationError {
    /// A matrix inversion failed or a computation produced non-finite values.
    #[error("numerical failure: {context}")]
    Numerical { context: String },

    /// A cluster admits no scorable hypothesis.
    #[error("degenerate cluster ({tracks} tracks, {reports} reports): {reason}")]
    DegenerateCluster {
        tracks: usize,
        reports: usize,
        reason: String,
    },

    /// Invalid pipeline configuration or malformed cycle inputs.
    #[error("configuration error: {reason}")]
    Configuration { reason: String },
}

impl AssociationError {
    pub fn numerical(context: impl Into<String>) -> Self {
        Self::Numerical {
            context: context.into(),
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }
}
