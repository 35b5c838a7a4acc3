mod config;
mod detection;
mod existence;
mod gating;
mod intervals;
mod matching;
mod motion;
mod rect;
mod registry;
mod track;
mod track_status;

pub use config::{ConfigError, TrackerConfig};
pub use detection::{Detection, DetectionBatch};
pub use existence::ExistenceModel;
pub use gating::{Gate, GateDecision};
pub use intervals::{IntervalLog, OcclusionInterval};
pub use matching::{
    AssignmentResult, AssociationStrategy, Greedy, Hungarian, associate, cosine_similarity,
    iou_distance,
};
pub use motion::{ConstantVelocity, MotionModel, MotionState};
pub use rect::{Rect, iou_batch};
pub use registry::{TrackRecord, TrackRegistry};
pub use track::Track;
pub use track_status::TrackStatus;
