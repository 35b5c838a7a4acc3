//! Track registry: the per-frame association and lifecycle engine.

use ndarray::Array1;
use serde::Serialize;
use tracing::debug;

use crate::tracker::config::{ConfigError, TrackerConfig};
use crate::tracker::detection::{Detection, DetectionBatch};
use crate::tracker::existence::ExistenceModel;
use crate::tracker::gating::Gate;
use crate::tracker::intervals::IntervalLog;
use crate::tracker::matching::{self, AssociationStrategy, Hungarian};
use crate::tracker::motion::{ConstantVelocity, MotionModel};
use crate::tracker::rect::Rect;
use crate::tracker::track::{Track, measurement_from};
use crate::tracker::track_status::TrackStatus;

/// Public per-frame output record.
#[derive(Debug, Clone, Serialize)]
pub struct TrackRecord {
    pub track_id: u64,
    /// Box in TLBR coordinates
    #[serde(rename = "box")]
    pub bbox: [f32; 4],
    pub score: f32,
    pub class_id: u32,
    pub age: u32,
    pub hits: u32,
    pub time_since_update: u32,
    pub is_confirmed: bool,
    /// `"tracked"` when matched this frame, `"tentative"` otherwise
    pub status: String,
    pub timestamp: Option<f64>,
    pub feature: Option<Vec<f32>>,
}

/// Owns the set of live tracks and the occlusion log, applies match
/// results, spawns and retires tracks, and emits the per-frame output.
///
/// One registry per stream; a frame update is an atomic unit of work and
/// the registry holds no ambient or shared state.
pub struct TrackRegistry {
    config: TrackerConfig,
    tracks: Vec<Track>,
    intervals: IntervalLog,
    existence: ExistenceModel,
    gate: Gate,
    motion_model: Box<dyn MotionModel>,
    association: Box<dyn AssociationStrategy>,
    next_track_id: u64,
    frame_id: u64,
}

impl TrackRegistry {
    /// Create a registry with the constant-velocity motion model and the
    /// exact assignment solver.
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        let motion_model = Box::new(ConstantVelocity::new(
            config.process_noise,
            config.measurement_noise,
            config.covariance_inflation,
        ));
        Self::with_strategies(config, motion_model, Box::new(Hungarian))
    }

    /// Create a registry with alternate motion/association variants. The
    /// lifecycle logic is identical for every variant.
    pub fn with_strategies(
        config: TrackerConfig,
        motion_model: Box<dyn MotionModel>,
        association: Box<dyn AssociationStrategy>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let existence = ExistenceModel {
            alpha_decay: config.alpha_decay,
            boost_on_detection: config.boost_on_detection,
            min_probability: config.min_probability,
        };
        let gate = Gate::new(config.base_sigma, config.time_widen_coeff);
        Ok(Self {
            config,
            tracks: Vec::new(),
            intervals: IntervalLog::new(),
            existence,
            gate,
            motion_model,
            association,
            next_track_id: 1,
            frame_id: 0,
        })
    }

    /// Process one frame of detections and return the surviving tracks,
    /// ordered by ascending `track_id`.
    pub fn update(&mut self, batch: DetectionBatch, timestamp: Option<f64>) -> Vec<TrackRecord> {
        self.frame_id += 1;
        let detections = batch.normalize();

        // Default bookkeeping and motion prediction for every live
        // track; matched tracks are reset below.
        for track in &mut self.tracks {
            track.mark_missed();
            self.motion_model.predict(&mut track.motion);
        }

        let track_boxes: Vec<Rect> = self.tracks.iter().map(Track::predicted_box).collect();
        let det_boxes: Vec<Rect> = detections.iter().map(|d| d.bbox).collect();
        let mut cost = matching::iou_distance(&track_boxes, &det_boxes);

        if self.config.appearance_weight > 0.0 {
            let track_features: Vec<Option<Vec<f32>>> =
                self.tracks.iter().map(|t| t.feature.clone()).collect();
            let det_features: Vec<Option<Vec<f32>>> =
                detections.iter().map(|d| d.feature.clone()).collect();
            matching::fuse_appearance(
                &mut cost,
                &track_features,
                &det_features,
                self.config.appearance_weight,
            );
        }

        if self.config.gate_filtering {
            let rejected = self.gate_rejections(&detections);
            matching::apply_gate(&mut cost, &rejected);
        }

        let result = matching::associate(
            &cost,
            1.0 - self.config.match_thresh,
            self.association.as_ref(),
        );

        for &(track_idx, det_idx) in &result.matches {
            let track = &mut self.tracks[track_idx];
            track.existence = self.existence.boost(track.existence);
            if self.intervals.has_open(track.track_id) {
                self.intervals.end(track.track_id, self.frame_id);
            }
            track.apply_detection(
                &detections[det_idx],
                self.motion_model.as_ref(),
                self.config.confirm_threshold,
            );
        }

        let mut retired = Vec::new();
        for &track_idx in &result.unmatched_tracks {
            let track = &mut self.tracks[track_idx];
            track.existence = self.existence.decay(track.existence);
            track.status = TrackStatus::Lost;
            if track.time_since_update > self.config.buffer_size || track.age > self.config.max_age
            {
                // The open interval stays open; the track was retired,
                // not re-matched.
                debug!(
                    track_id = track.track_id,
                    frame = self.frame_id,
                    "retiring track"
                );
                retired.push(track.track_id);
            } else if !self.intervals.has_open(track.track_id) {
                self.intervals.start(
                    track.track_id,
                    self.frame_id,
                    Some("missed_detection".to_string()),
                );
            }
        }
        if !retired.is_empty() {
            self.tracks.retain(|t| !retired.contains(&t.track_id));
        }

        for &det_idx in &result.unmatched_detections {
            let detection = &detections[det_idx];
            if detection.score < self.config.track_thresh {
                continue;
            }
            let track =
                Track::from_detection(self.next_track_id, detection, self.motion_model.as_ref());
            debug!(
                track_id = track.track_id,
                frame = self.frame_id,
                score = detection.score,
                "spawning track"
            );
            self.next_track_id += 1;
            self.tracks.push(track);
        }

        self.tracks.sort_by_key(|t| t.track_id);

        self.tracks
            .iter()
            .filter(|t| t.is_confirmed || t.hits >= 1)
            .map(|t| record_for(t, timestamp))
            .collect()
    }

    /// Gate every (track, detection) pair and collect the rejections.
    /// `dt` is the track's time since last update at association time.
    fn gate_rejections(&self, detections: &[Detection]) -> Vec<(usize, usize)> {
        let mut rejected = Vec::new();
        for (track_idx, track) in self.tracks.iter().enumerate() {
            let predicted = track.motion.position();
            let covariance = track.motion.position_covariance();
            for (det_idx, detection) in detections.iter().enumerate() {
                let measurement = measurement_from(detection.bbox);
                let residual = Array1::from_iter(
                    measurement
                        .iter()
                        .zip(predicted.iter())
                        .map(|(m, p)| m - p),
                );
                let decision = self
                    .gate
                    .evaluate(&residual, &covariance, track.time_since_update);
                if !decision.accepted {
                    rejected.push((track_idx, det_idx));
                }
            }
        }
        rejected
    }

    /// Live tracks, including ones not emitted this frame.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// The occlusion interval log accumulated so far.
    pub fn occlusion_log(&self) -> &IntervalLog {
        &self.intervals
    }

    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}

fn record_for(track: &Track, timestamp: Option<f64>) -> TrackRecord {
    let status = if track.time_since_update == 0 {
        "tracked"
    } else {
        "tentative"
    };
    TrackRecord {
        track_id: track.track_id,
        bbox: track.bbox.to_tlbr(),
        score: track.score,
        class_id: track.class_id,
        age: track.age,
        hits: track.hits,
        time_since_update: track.time_since_update,
        is_confirmed: track.is_confirmed,
        status: status.to_string(),
        timestamp,
        feature: track.feature.clone(),
    }
}
