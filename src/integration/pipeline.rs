//! TrackerPipeline for combining detection with tracking.

use crate::tracker::{ConfigError, DetectionBatch, TrackRecord, TrackRegistry, TrackerConfig};

use super::DetectionSource;

/// A combined tracker that bundles detection inference with the track
/// registry.
///
/// This struct provides a convenient way to run end-to-end tracking by
/// combining any `DetectionSource` with a `TrackRegistry`.
pub struct TrackerPipeline<D: DetectionSource> {
    detector: D,
    registry: TrackRegistry,
}

impl<D: DetectionSource> TrackerPipeline<D> {
    /// Create a new tracking pipeline with the given detector and tracker config.
    pub fn new(detector: D, config: TrackerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            detector,
            registry: TrackRegistry::new(config)?,
        })
    }

    /// Create a new tracking pipeline with default tracker configuration.
    pub fn with_default_config(detector: D) -> Result<Self, ConfigError> {
        Self::new(detector, TrackerConfig::default())
    }

    /// Process a single frame and return the surviving tracks.
    ///
    /// This method runs detection on the input image and then updates
    /// the registry with the detected objects.
    ///
    /// # Arguments
    /// * `input` - Raw image bytes
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    /// * `timestamp` - Optional frame timestamp copied into the output
    ///
    /// # Returns
    /// A vector of `TrackRecord` entries, or a detection error.
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
        timestamp: Option<f64>,
    ) -> Result<Vec<TrackRecord>, D::Error> {
        let detections = self.detector.detect(input, width, height)?;
        Ok(self
            .registry
            .update(DetectionBatch::from(detections), timestamp))
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a reference to the underlying registry.
    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    /// Get a mutable reference to the underlying registry.
    pub fn registry_mut(&mut self) -> &mut TrackRegistry {
        &mut self.registry
    }
}
