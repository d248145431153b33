//! Kalman state update with an identity observation model.
//!
//! State and measurement share the same 3-dimensional space, so H = I and
//! the update reduces to:
//!
//! K  = P·(P + R)⁻¹
//! x' = x + K·(z − x)
//! P' = (I − K)·P
//!
//! A singular innovation covariance (P + R) or a non-finite result fails
//! with a numerical error scoped to the single track being updated; the
//! caller continues with other tracks.

use crate::error::AssociationError;
use crate::types::{StateCov, StateVec};

/// Result of one update step.
#[derive(Clone, Debug)]
pub struct KfUpdate {
    pub state: StateVec,
    pub cov: StateCov,
    /// Kalman gain K
    pub gain: StateCov,
}

/// Fuse a track's prior (state, cov) with measurement `z` under noise `r`.
pub fn update(
    state: &StateVec,
    cov: &StateCov,
    z: &StateVec,
    r: &StateCov,
) -> Result<KfUpdate, AssociationError> {
    let s = cov + r;
    let s_inv = s
        .try_inverse()
        .ok_or_else(|| AssociationError::numerical("innovation covariance (P + R) is singular"))?;

    let gain = cov * s_inv;
    let new_state = state + gain * (z - state);
    let new_cov = (StateCov::identity() - gain) * cov;

    if new_state.iter().any(|v| !v.is_finite()) || new_cov.iter().any(|v| !v.is_finite()) {
        return Err(AssociationError::numerical(
            "update produced non-finite state or covariance",
        ));
    }

    Ok(KfUpdate {
        state: new_state,
        cov: new_cov,
        gain,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    #[test]
    fn identity_prior_moves_halfway() {
        // P = R = I → K = ½I: the posterior sits midway between prior and
        // measurement, with covariance halved.
        let state = Vector3::new(6.0, 6.0, 10.0);
        let cov = StateCov::identity();
        let z = Vector3::new(7.0, 7.0, 10.0);
        let r = StateCov::identity();

        let res = update(&state, &cov, &z, &r).unwrap();
        assert_abs_diff_eq!(res.state, Vector3::new(6.5, 6.5, 10.0), epsilon = 1e-12);
        assert_abs_diff_eq!(res.cov, StateCov::identity() * 0.5, epsilon = 1e-12);
    }

    #[test]
    fn update_moves_toward_measurement_and_shrinks_covariance() {
        let state = Vector3::new(15.0, 15.0, 10.0);
        let cov = StateCov::identity();
        let z = Vector3::new(16.0, 16.0, 10.0);
        let r = StateCov::identity();

        let res = update(&state, &cov, &z, &r).unwrap();
        let before = (z - state).norm();
        let after = (z - res.state).norm();
        assert!(after < before, "state must move toward the measurement");

        let prior_eigs = cov.symmetric_eigenvalues();
        let post_eigs = res.cov.symmetric_eigenvalues();
        for (post, prior) in post_eigs.iter().zip(prior_eigs.iter()) {
            assert!(post < prior, "every eigenvalue must strictly decrease");
        }
    }

    #[test]
    fn singular_innovation_covariance_is_an_error() {
        // P = −R makes P + R exactly zero.
        let state = Vector3::zeros();
        let cov = StateCov::identity() * -1.0;
        let z = Vector3::new(1.0, 0.0, 0.0);
        let r = StateCov::identity();

        let err = update(&state, &cov, &z, &r).unwrap_err();
        assert!(matches!(err, AssociationError::Numerical { .. }));
    }
}
