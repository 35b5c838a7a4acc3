//! Tracker configuration and construction-time validation.

use thiserror::Error;

/// Invalid configuration, surfaced when the registry is constructed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value}")]
    OutOfRange {
        name: &'static str,
        expected: &'static str,
        value: f64,
    },
}

/// Configuration for the track registry. Every knob has a default and is
/// independently settable.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Minimum detection score for spawning a new track
    pub track_thresh: f32,
    /// Minimum IoU for accepting an assignment pair
    pub match_thresh: f32,
    /// Frames a track may go unmatched before retirement
    pub buffer_size: u32,
    /// Maximum age of an unmatched track before retirement
    pub max_age: u32,
    /// Hits required before a track is confirmed
    pub confirm_threshold: u32,
    /// Per-frame existence decay factor while unsupported
    pub alpha_decay: f64,
    /// Existence bump on every successful match
    pub boost_on_detection: f64,
    /// Existence floor; the probability never reaches zero
    pub min_probability: f64,
    /// Gate width at dt = 0, in sigma
    pub base_sigma: f64,
    /// Gate widening per frame since last update
    pub time_widen_coeff: f64,
    /// Process noise intensity, reserved by the constant-velocity model
    pub process_noise: f64,
    /// Measurement noise written into the covariance on update
    pub measurement_noise: f64,
    /// Multiplicative covariance growth per predict
    pub covariance_inflation: f64,
    /// Appearance blending weight; 0 disables appearance fusion
    pub appearance_weight: f32,
    /// Apply the Mahalanobis gate as an admissibility mask
    pub gate_filtering: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            track_thresh: 0.5,
            match_thresh: 0.8,
            buffer_size: 30,
            max_age: 60,
            confirm_threshold: 3,
            alpha_decay: 0.94,
            boost_on_detection: 0.2,
            min_probability: 0.01,
            base_sigma: 3.0,
            time_widen_coeff: 0.2,
            process_noise: 1.0,
            measurement_noise: 1.0,
            covariance_inflation: 1.05,
            appearance_weight: 0.0,
            gate_filtering: false,
        }
    }
}

impl TrackerConfig {
    /// Validate numeric ranges. Called by the registry constructor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            (0.0..=1.0).contains(&self.track_thresh),
            "track_thresh",
            "within [0, 1]",
            f64::from(self.track_thresh),
        )?;
        ensure(
            (0.0..=1.0).contains(&self.match_thresh),
            "match_thresh",
            "within [0, 1]",
            f64::from(self.match_thresh),
        )?;
        ensure(
            self.confirm_threshold >= 1,
            "confirm_threshold",
            "at least 1",
            f64::from(self.confirm_threshold),
        )?;
        ensure(
            self.alpha_decay > 0.0 && self.alpha_decay <= 1.0,
            "alpha_decay",
            "within (0, 1]",
            self.alpha_decay,
        )?;
        ensure(
            self.boost_on_detection >= 0.0,
            "boost_on_detection",
            "non-negative",
            self.boost_on_detection,
        )?;
        ensure(
            self.min_probability > 0.0 && self.min_probability <= 1.0,
            "min_probability",
            "within (0, 1]",
            self.min_probability,
        )?;
        ensure(
            self.base_sigma >= 0.0,
            "base_sigma",
            "non-negative",
            self.base_sigma,
        )?;
        ensure(
            self.time_widen_coeff >= 0.0,
            "time_widen_coeff",
            "non-negative",
            self.time_widen_coeff,
        )?;
        ensure(
            self.process_noise >= 0.0,
            "process_noise",
            "non-negative",
            self.process_noise,
        )?;
        ensure(
            self.measurement_noise > 0.0,
            "measurement_noise",
            "positive",
            self.measurement_noise,
        )?;
        ensure(
            self.covariance_inflation >= 1.0,
            "covariance_inflation",
            "at least 1",
            self.covariance_inflation,
        )?;
        ensure(
            (0.0..=1.0).contains(&self.appearance_weight),
            "appearance_weight",
            "within [0, 1]",
            f64::from(self.appearance_weight),
        )?;
        Ok(())
    }
}

fn ensure(ok: bool, name: &'static str, expected: &'static str, value: f64) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            expected,
            value,
        })
    }
}
