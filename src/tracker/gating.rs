//! Statistical gating between predicted track state and candidate detections.

use ndarray::{Array1, Array2};

use crate::tracker::motion::MEASUREMENT_DIM;

/// Outcome of a gate evaluation.
#[derive(Debug, Clone, Copy)]
pub struct GateDecision {
    /// Squared Mahalanobis distance of the residual
    pub distance: f64,
    /// Acceptance threshold for this elapsed time
    pub threshold: f64,
    pub accepted: bool,
}

/// Mahalanobis gate whose acceptance region widens the longer a track
/// has gone unobserved.
#[derive(Debug, Clone)]
pub struct Gate {
    pub base_sigma: f64,
    pub time_widen_coeff: f64,
}

impl Default for Gate {
    fn default() -> Self {
        Self::new(3.0, 0.2)
    }
}

impl Gate {
    pub fn new(base_sigma: f64, time_widen_coeff: f64) -> Self {
        Self {
            base_sigma,
            time_widen_coeff,
        }
    }

    /// Evaluate a 4-dim residual against a 4x4 covariance, `dt` frames
    /// after the track's last update.
    ///
    /// The covariance is inverted through an SVD pseudo-inverse, so
    /// near-singular and singular matrices degrade instead of failing.
    pub fn evaluate(
        &self,
        residual: &Array1<f64>,
        covariance: &Array2<f64>,
        dt: u32,
    ) -> GateDecision {
        let inv = pseudo_inverse_4x4(covariance);
        let mut distance = 0.0;
        for i in 0..MEASUREMENT_DIM {
            for j in 0..MEASUREMENT_DIM {
                distance += residual[i] * inv[[i, j]] * residual[j];
            }
        }

        let threshold = (self.base_sigma + self.time_widen_coeff * f64::from(dt)).powi(2);

        GateDecision {
            distance,
            threshold,
            accepted: distance <= threshold,
        }
    }
}

/// Pseudo-inverse of a 4x4 covariance using nalgebra's SVD (pure Rust,
/// no BLAS/LAPACK).
fn pseudo_inverse_4x4(m: &Array2<f64>) -> Array2<f64> {
    let mut nm = nalgebra::Matrix4::zeros();
    for i in 0..MEASUREMENT_DIM {
        for j in 0..MEASUREMENT_DIM {
            nm[(i, j)] = m[[i, j]];
        }
    }
    // Errs only for a negative tolerance, so the zero fallback is unreachable.
    let pinv = nm
        .svd(true, true)
        .pseudo_inverse(1e-12)
        .unwrap_or_else(|_| nalgebra::Matrix4::zeros());
    let mut res = Array2::zeros((MEASUREMENT_DIM, MEASUREMENT_DIM));
    for i in 0..MEASUREMENT_DIM {
        for j in 0..MEASUREMENT_DIM {
            res[[i, j]] = pinv[(i, j)];
        }
    }
    res
}
