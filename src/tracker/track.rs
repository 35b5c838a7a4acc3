//! A persistent hypothesis of a single object's trajectory across frames.

use crate::tracker::detection::Detection;
use crate::tracker::motion::{MEASUREMENT_DIM, MotionModel, MotionState};
use crate::tracker::rect::Rect;
use crate::tracker::track_status::TrackStatus;

/// A live track, owned exclusively by the registry.
#[derive(Debug, Clone)]
pub struct Track {
    /// Unique identifier, allocated by the registry and never reused
    pub track_id: u64,
    /// Box of the last supporting detection
    pub bbox: Rect,
    /// Score of the last supporting detection
    pub score: f32,
    /// Class label from the last supporting detection
    pub class_id: u32,
    /// Most recent appearance embedding, if any
    pub feature: Option<Vec<f32>>,
    /// Successful associations since spawn
    pub hits: u32,
    /// Frames since creation
    pub age: u32,
    /// Frames since the last supporting detection; 0 iff matched this frame
    pub time_since_update: u32,
    /// Set once `hits` reaches the confirmation threshold; never reverts
    pub is_confirmed: bool,
    /// Existence probability in [min_probability, 1.0]
    pub existence: f64,
    /// Lifecycle status
    pub status: TrackStatus,
    /// Motion estimate, operated on by the registry's motion model
    pub motion: MotionState,
}

impl Track {
    /// Spawn a track from an unmatched detection.
    pub fn from_detection(track_id: u64, detection: &Detection, model: &dyn MotionModel) -> Self {
        let mut motion = MotionState::new();
        model.update(&mut motion, measurement_from(detection.bbox));
        Self {
            track_id,
            bbox: detection.bbox,
            score: detection.score,
            class_id: detection.class_id,
            feature: detection.feature.clone(),
            hits: 1,
            age: 1,
            time_since_update: 0,
            is_confirmed: false,
            existence: 1.0,
            status: TrackStatus::Tentative,
            motion,
        }
    }

    /// Per-frame default bookkeeping, overridden by [`Self::apply_detection`]
    /// when the track is matched.
    pub fn mark_missed(&mut self) {
        self.age += 1;
        self.time_since_update += 1;
    }

    /// Fold a matched detection into the track.
    pub fn apply_detection(
        &mut self,
        detection: &Detection,
        model: &dyn MotionModel,
        confirm_threshold: u32,
    ) {
        model.update(&mut self.motion, measurement_from(detection.bbox));
        self.bbox = detection.bbox;
        self.score = detection.score;
        self.class_id = detection.class_id;
        self.feature = detection.feature.clone();
        self.hits += 1;
        self.time_since_update = 0;
        if self.hits >= confirm_threshold {
            self.is_confirmed = true;
        }
        self.status = TrackStatus::Tracked;
    }

    /// Predicted box for this frame's association, read from the motion
    /// state's position block.
    pub fn predicted_box(&self) -> Rect {
        let mean = &self.motion.mean;
        Rect::from_cxcywh(
            mean[0] as f32,
            mean[1] as f32,
            mean[2] as f32,
            mean[3] as f32,
        )
    }
}

/// Measurement vector for a box: `[cx, cy, w, h]`.
pub(crate) fn measurement_from(bbox: Rect) -> [f64; MEASUREMENT_DIM] {
    let [cx, cy, w, h] = bbox.to_cxcywh();
    [f64::from(cx), f64::from(cy), f64::from(w), f64::from(h)]
}
