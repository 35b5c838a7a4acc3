//! Occlusion-aware multi-object tracking.
//!
//! Converts per-frame detection batches into a maintained set of tracks
//! with stable identities through occlusion. Each track carries a motion
//! estimate, an existence probability and an occlusion history; the
//! registry associates detections to tracks with an exact assignment
//! solver and manages the spawn/confirm/retire lifecycle.

pub mod integration;
pub mod tracker;

pub use integration::{DetectionBuilder, DetectionSource, IntoDetections, TrackerPipeline};
pub use tracker::{
    ConfigError, Detection, DetectionBatch, OcclusionInterval, Rect, TrackRecord, TrackRegistry,
    TrackStatus, TrackerConfig,
};
