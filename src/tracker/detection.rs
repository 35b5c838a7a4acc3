//! Detection inputs for a single frame.
//!
//! Detections are ephemeral: they are owned by the current frame's
//! processing and never persisted beyond it.

use tracing::warn;

use crate::tracker::rect::Rect;

/// A single detector output.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Bounding box
    pub bbox: Rect,
    /// Detection confidence score in [0, 1]
    pub score: f32,
    /// Detector class id
    pub class_id: u32,
    /// Optional fixed-length appearance embedding
    pub feature: Option<Vec<f32>>,
}

impl Detection {
    /// Create a detection from a TLBR box and a score.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Self {
        Self {
            bbox: Rect::from_tlbr(x1, y1, x2, y2),
            score,
            class_id: 0,
            feature: None,
        }
    }

    pub fn from_rect(bbox: Rect, score: f32) -> Self {
        Self {
            bbox,
            score,
            class_id: 0,
            feature: None,
        }
    }

    pub fn with_class(mut self, class_id: u32) -> Self {
        self.class_id = class_id;
        self
    }

    pub fn with_feature(mut self, feature: Vec<f32>) -> Self {
        self.feature = Some(feature);
        self
    }
}

/// Parallel-array detection batch as produced by detector backends.
///
/// `scores` and `classes` may be shorter or longer than `boxes`; the
/// batch is normalized rather than rejected.
#[derive(Debug, Clone, Default)]
pub struct DetectionBatch {
    pub boxes: Vec<Rect>,
    pub scores: Vec<f32>,
    pub classes: Vec<u32>,
    /// One optional embedding per box, when the detector provides them
    pub features: Option<Vec<Option<Vec<f32>>>>,
}

impl DetectionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Append a detection, keeping all parallel arrays in step.
    pub fn push(&mut self, detection: Detection) {
        let index = self.boxes.len();
        self.boxes.push(detection.bbox);
        self.scores.push(detection.score);
        self.classes.push(detection.class_id);
        if let Some(features) = &mut self.features {
            features.push(detection.feature);
        } else if let Some(feature) = detection.feature {
            // First embedding seen: backfill earlier rows with None.
            let mut filled = vec![None; index];
            filled.push(Some(feature));
            self.features = Some(filled);
        }
    }

    /// Resolve the batch into per-frame detections.
    ///
    /// Mismatched `scores`/`classes` lengths are padded with zeros (and
    /// excess entries dropped) instead of failing; missing feature rows
    /// become `None`.
    pub fn normalize(self) -> Vec<Detection> {
        let n = self.boxes.len();
        if self.scores.len() != n || self.classes.len() != n {
            warn!(
                boxes = n,
                scores = self.scores.len(),
                classes = self.classes.len(),
                "detection batch arrays disagree, padding with zeros"
            );
        }

        let mut scores = self.scores;
        scores.resize(n, 0.0);
        let mut classes = self.classes;
        classes.resize(n, 0);
        let features = self.features;

        self.boxes
            .into_iter()
            .enumerate()
            .map(|(i, bbox)| Detection {
                bbox,
                score: scores[i],
                class_id: classes[i],
                feature: features
                    .as_ref()
                    .and_then(|rows| rows.get(i).cloned().flatten()),
            })
            .collect()
    }
}

impl From<Vec<Detection>> for DetectionBatch {
    fn from(detections: Vec<Detection>) -> Self {
        let mut batch = DetectionBatch::new();
        for detection in detections {
            batch.push(detection);
        }
        batch
    }
}
