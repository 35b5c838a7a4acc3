//! Occlusion interval logging.

use serde::Serialize;

/// A frame range during which a track had no supporting detection.
///
/// The interval is open while `end_frame` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcclusionInterval {
    pub track_id: u64,
    pub start_frame: u64,
    pub end_frame: Option<u64>,
    pub cause: Option<String>,
}

/// Append-only log of occlusion intervals, ordered by open time.
#[derive(Debug, Clone, Default)]
pub struct IntervalLog {
    intervals: Vec<OcclusionInterval>,
}

impl IntervalLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new interval for `track_id` at `frame`.
    ///
    /// Opens stack if the caller does not close the previous interval
    /// first; the registry always closes before re-opening.
    pub fn start(&mut self, track_id: u64, frame: u64, cause: Option<String>) {
        self.intervals.push(OcclusionInterval {
            track_id,
            start_frame: frame,
            end_frame: None,
            cause,
        });
    }

    /// Close the most recently opened open interval for `track_id`.
    /// No-op when none is open.
    pub fn end(&mut self, track_id: u64, frame: u64) {
        for interval in self.intervals.iter_mut().rev() {
            if interval.track_id == track_id && interval.end_frame.is_none() {
                interval.end_frame = Some(frame);
                break;
            }
        }
    }

    /// Whether `track_id` currently has an open interval.
    pub fn has_open(&self, track_id: u64) -> bool {
        self.intervals
            .iter()
            .any(|i| i.track_id == track_id && i.end_frame.is_none())
    }

    pub fn intervals(&self) -> &[OcclusionInterval] {
        &self.intervals
    }

    /// Ordered export of all intervals as plain records.
    pub fn to_serializable(&self) -> Vec<OcclusionInterval> {
        self.intervals.clone()
    }
}
