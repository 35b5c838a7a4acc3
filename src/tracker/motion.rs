//! Constant-velocity motion estimation with covariance inflation.

use ndarray::{Array1, Array2, s};

/// Dimensionality of the position/size measurement block.
pub const MEASUREMENT_DIM: usize = 4;
/// Full state dimensionality: position/size plus velocity.
pub const STATE_DIM: usize = 2 * MEASUREMENT_DIM;

/// Per-track motion estimate: 8-dim state mean and 8x8 covariance.
#[derive(Debug, Clone)]
pub struct MotionState {
    pub mean: Array1<f64>,
    pub covariance: Array2<f64>,
}

impl MotionState {
    /// Zero state with identity covariance.
    pub fn new() -> Self {
        Self {
            mean: Array1::zeros(STATE_DIM),
            covariance: Array2::eye(STATE_DIM),
        }
    }

    /// Position/size block of the state mean.
    pub fn position(&self) -> Array1<f64> {
        self.mean.slice(s![..MEASUREMENT_DIM]).to_owned()
    }

    /// Top-left 4x4 covariance block (position/size uncertainty).
    pub fn position_covariance(&self) -> Array2<f64> {
        self.covariance
            .slice(s![..MEASUREMENT_DIM, ..MEASUREMENT_DIM])
            .to_owned()
    }
}

impl Default for MotionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Motion model applied to a track's embedded state.
///
/// Implementations are stateless; all per-track state lives in
/// [`MotionState`]. Alternate models can be swapped into the registry
/// without touching its lifecycle logic.
pub trait MotionModel {
    /// Advance the state by one frame. Mutates the stored covariance.
    /// Never fails.
    fn predict(&self, state: &mut MotionState);

    /// Fold a position/size measurement into the state.
    fn update(&self, state: &mut MotionState, measurement: [f64; MEASUREMENT_DIM]);
}

/// Constant-velocity estimator.
///
/// `predict` approximates process-noise growth by inflating the whole
/// covariance with a fixed multiplicative factor; the state mean is left
/// in place (no transition-matrix propagation). `update` overwrites the
/// position/size sub-state with the measurement and resets that
/// covariance block to `measurement_noise * I`. There is no Kalman gain,
/// and velocity components are never re-estimated from measurement deltas.
#[derive(Debug, Clone)]
pub struct ConstantVelocity {
    /// Reserved process-noise intensity; not consumed by this variant
    pub process_noise: f64,
    pub measurement_noise: f64,
    pub covariance_inflation: f64,
}

impl ConstantVelocity {
    pub fn new(process_noise: f64, measurement_noise: f64, covariance_inflation: f64) -> Self {
        Self {
            process_noise,
            measurement_noise,
            covariance_inflation,
        }
    }
}

impl Default for ConstantVelocity {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.05)
    }
}

impl MotionModel for ConstantVelocity {
    fn predict(&self, state: &mut MotionState) {
        state.covariance *= self.covariance_inflation;
    }

    fn update(&self, state: &mut MotionState, measurement: [f64; MEASUREMENT_DIM]) {
        for (i, &value) in measurement.iter().enumerate() {
            state.mean[i] = value;
        }
        for i in 0..MEASUREMENT_DIM {
            for j in 0..MEASUREMENT_DIM {
                state.covariance[[i, j]] = if i == j { self.measurement_noise } else { 0.0 };
            }
        }
    }
}
