use permatrack_rs::tracker::Greedy;
use permatrack_rs::{Detection, DetectionBatch, TrackRegistry, TrackerConfig};

fn batch(detections: Vec<Detection>) -> DetectionBatch {
    DetectionBatch::from(detections)
}

#[test]
fn test_basic_tracking() {
    let mut registry = TrackRegistry::new(TrackerConfig::default()).unwrap();

    // Frame 1: one detection spawns a track.
    let records = registry.update(batch(vec![Detection::new(100.0, 100.0, 200.0, 200.0, 0.9)]), None);
    assert_eq!(records.len(), 1);
    let id = records[0].track_id;
    assert_eq!(records[0].hits, 1);
    assert_eq!(records[0].status, "tracked");

    // Frame 2: the same object, unmoved. The identity persists.
    let records = registry.update(batch(vec![Detection::new(100.0, 100.0, 200.0, 200.0, 0.9)]), None);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].track_id, id);
    assert_eq!(records[0].hits, 2);

    // Frame 3: the object disappears; the track is kept as tentative.
    let records = registry.update(batch(vec![]), None);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].track_id, id);
    assert_eq!(records[0].status, "tentative");

    // Frame 4: it reappears in place and is re-matched, same identity.
    let records = registry.update(batch(vec![Detection::new(100.0, 100.0, 200.0, 200.0, 0.9)]), None);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].track_id, id);
    assert_eq!(records[0].status, "tracked");
    assert_eq!(records[0].time_since_update, 0);
}

#[test]
fn test_confirmation_after_three_hits() {
    let mut registry = TrackRegistry::new(TrackerConfig::default()).unwrap();
    let det = || Detection::new(10.0, 10.0, 50.0, 50.0, 0.9);

    let records = registry.update(batch(vec![det()]), None);
    assert!(!records[0].is_confirmed);
    assert_eq!(records[0].hits, 1);

    let records = registry.update(batch(vec![det()]), None);
    assert!(!records[0].is_confirmed);
    assert_eq!(records[0].hits, 2);

    let records = registry.update(batch(vec![det()]), None);
    assert!(records[0].is_confirmed);
    assert_eq!(records[0].hits, 3);
    assert_eq!(records[0].time_since_update, 0);
}

#[test]
fn test_confirmation_never_reverts() {
    let mut registry = TrackRegistry::new(TrackerConfig::default()).unwrap();
    let det = || Detection::new(10.0, 10.0, 50.0, 50.0, 0.9);

    for _ in 0..3 {
        registry.update(batch(vec![det()]), None);
    }
    // Miss a few frames; the confirmation flag must stay set.
    for _ in 0..5 {
        let records = registry.update(batch(vec![]), None);
        assert_eq!(records.len(), 1);
        assert!(records[0].is_confirmed);
    }
}

#[test]
fn test_retirement_after_buffer_and_open_interval() {
    let mut registry = TrackRegistry::new(TrackerConfig::default()).unwrap();
    let det = || Detection::new(10.0, 10.0, 50.0, 50.0, 0.9);

    for _ in 0..3 {
        registry.update(batch(vec![det()]), None);
    }
    let id = registry.tracks()[0].track_id;

    // 30 missed frames: the track survives as tentative.
    for miss in 1..=30 {
        let records = registry.update(batch(vec![]), None);
        assert_eq!(records.len(), 1, "alive after {miss} missed frames");
        assert_eq!(records[0].time_since_update, miss);
        assert_eq!(records[0].status, "tentative");
    }

    // Missed frame 31 exceeds the buffer: retired, absent from output.
    let records = registry.update(batch(vec![]), None);
    assert!(records.is_empty());
    assert!(registry.tracks().is_empty());

    // The occlusion interval opened at the first missed frame (frame 4)
    // and was never closed since the track was retired, not re-matched.
    let intervals = registry.occlusion_log().to_serializable();
    assert_eq!(intervals.len(), 1);
    assert_eq!(intervals[0].track_id, id);
    assert_eq!(intervals[0].start_frame, 4);
    assert_eq!(intervals[0].end_frame, None);
}

#[test]
fn test_spawn_requires_track_thresh() {
    let mut registry = TrackRegistry::new(TrackerConfig::default()).unwrap();

    let records = registry.update(batch(vec![Detection::new(0.0, 0.0, 10.0, 10.0, 0.4)]), None);
    assert!(records.is_empty());
    assert!(registry.tracks().is_empty());

    let records = registry.update(batch(vec![Detection::new(0.0, 0.0, 10.0, 10.0, 0.6)]), None);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].hits, 1);
    assert!(!records[0].is_confirmed);
}

#[test]
fn test_empty_batch_ages_live_track() {
    let mut registry = TrackRegistry::new(TrackerConfig::default()).unwrap();
    let records = registry.update(batch(vec![Detection::new(10.0, 10.0, 50.0, 50.0, 0.9)]), None);
    let id = records[0].track_id;
    assert_eq!(records[0].age, 1);

    let records = registry.update(batch(vec![]), None);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].track_id, id);
    assert_eq!(records[0].age, 2);
    assert_eq!(records[0].time_since_update, 1);
}

#[test]
fn test_occlusion_interval_closed_on_rematch() {
    let mut registry = TrackRegistry::new(TrackerConfig::default()).unwrap();
    let det = || Detection::new(10.0, 10.0, 50.0, 50.0, 0.9);

    registry.update(batch(vec![det()]), None); // frame 1
    registry.update(batch(vec![]), None); // frame 2: occlusion opens
    registry.update(batch(vec![]), None); // frame 3
    registry.update(batch(vec![det()]), None); // frame 4: re-matched

    let intervals = registry.occlusion_log().to_serializable();
    assert_eq!(intervals.len(), 1);
    assert_eq!(intervals[0].start_frame, 2);
    assert_eq!(intervals[0].end_frame, Some(4));
    assert_eq!(intervals[0].cause.as_deref(), Some("missed_detection"));

    // A second occlusion opens a second interval.
    registry.update(batch(vec![]), None); // frame 5
    let intervals = registry.occlusion_log().to_serializable();
    assert_eq!(intervals.len(), 2);
    assert_eq!(intervals[1].start_frame, 5);
    assert_eq!(intervals[1].end_frame, None);
}

#[test]
fn test_monotonic_ids_never_reused() {
    let mut registry = TrackRegistry::new(TrackerConfig::default()).unwrap();
    let near = || Detection::new(0.0, 0.0, 20.0, 20.0, 0.9);
    let far = || Detection::new(500.0, 500.0, 520.0, 520.0, 0.9);

    registry.update(batch(vec![near(), far()]), None);
    let mut ids: Vec<u64> = registry.tracks().iter().map(|t| t.track_id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2]);

    // Retire track 1 by starving it past the buffer while track 2 stays
    // matched.
    for _ in 0..32 {
        registry.update(batch(vec![far()]), None);
    }
    let ids: Vec<u64> = registry.tracks().iter().map(|t| t.track_id).collect();
    assert_eq!(ids, vec![2]);

    // A new object where track 1 used to be gets a fresh id, not 1.
    registry.update(batch(vec![near(), far()]), None);
    let ids: Vec<u64> = registry.tracks().iter().map(|t| t.track_id).collect();
    assert_eq!(ids, vec![2, 3]);
}

#[test]
fn test_deterministic_output() {
    let script: Vec<Vec<Detection>> = (0..40)
        .map(|frame| {
            let offset = (frame % 7) as f32;
            let mut dets = vec![Detection::new(
                100.0 + offset,
                100.0,
                200.0 + offset,
                200.0,
                0.9,
            )];
            if frame % 3 != 0 {
                dets.push(Detection::new(400.0, 400.0 + offset, 450.0, 450.0 + offset, 0.7));
            }
            if frame > 20 {
                dets.push(Detection::new(10.0, 10.0, 30.0, 30.0, 0.55));
            }
            dets
        })
        .collect();

    let run = |script: &[Vec<Detection>]| -> Vec<(u64, [f32; 4], String, u32)> {
        let mut registry = TrackRegistry::new(TrackerConfig::default()).unwrap();
        let mut out = Vec::new();
        for (frame, dets) in script.iter().enumerate() {
            for record in registry.update(batch(dets.clone()), Some(frame as f64)) {
                out.push((record.track_id, record.bbox, record.status, record.hits));
            }
        }
        out
    };

    assert_eq!(run(&script), run(&script));
}

#[test]
fn test_output_sorted_by_track_id() {
    let mut registry = TrackRegistry::new(TrackerConfig::default()).unwrap();
    let records = registry.update(
        batch(vec![
            Detection::new(500.0, 500.0, 520.0, 520.0, 0.9),
            Detection::new(0.0, 0.0, 20.0, 20.0, 0.9),
            Detection::new(200.0, 200.0, 250.0, 250.0, 0.9),
        ]),
        None,
    );
    let ids: Vec<u64> = records.iter().map(|r| r.track_id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
}

#[test]
fn test_existence_bounds_hold() {
    let config = TrackerConfig::default();
    let min_probability = config.min_probability;
    let mut registry = TrackRegistry::new(config).unwrap();
    let det = || Detection::new(10.0, 10.0, 50.0, 50.0, 0.9);

    registry.update(batch(vec![det()]), None);
    for frame in 0..25 {
        // Alternate long occlusions with bursts of support.
        if frame % 5 == 0 {
            registry.update(batch(vec![det()]), None);
        } else {
            registry.update(batch(vec![]), None);
        }
        for track in registry.tracks() {
            assert!(track.existence >= min_probability);
            assert!(track.existence <= 1.0);
        }
    }
}

#[test]
fn test_timestamp_propagated() {
    let mut registry = TrackRegistry::new(TrackerConfig::default()).unwrap();
    let records = registry.update(
        batch(vec![Detection::new(0.0, 0.0, 10.0, 10.0, 0.9)]),
        Some(13.5),
    );
    assert_eq!(records[0].timestamp, Some(13.5));

    let records = registry.update(batch(vec![]), None);
    assert_eq!(records[0].timestamp, None);
}

#[test]
fn test_malformed_batch_is_normalized() {
    let mut registry = TrackRegistry::new(TrackerConfig::default()).unwrap();
    let malformed = DetectionBatch {
        boxes: vec![
            permatrack_rs::Rect::from_tlbr(0.0, 0.0, 20.0, 20.0),
            permatrack_rs::Rect::from_tlbr(100.0, 100.0, 120.0, 120.0),
        ],
        scores: vec![0.9],
        classes: vec![],
        features: None,
    };

    // The second box is padded with score 0.0 and must not spawn.
    let records = registry.update(malformed, None);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].bbox, [0.0, 0.0, 20.0, 20.0]);
    assert_eq!(records[0].class_id, 0);
}

#[test]
fn test_gate_filtering_rejects_fast_motion() {
    let det_start = || Detection::new(10.0, 10.0, 50.0, 50.0, 0.9);
    // Shifted 4px: IoU ~ 0.818, above match_thresh, but the residual is
    // outside the (3.0 + 0.2*1)^2 gate.
    let det_jump = || Detection::new(14.0, 10.0, 54.0, 50.0, 0.9);

    let mut plain = TrackRegistry::new(TrackerConfig::default()).unwrap();
    plain.update(batch(vec![det_start()]), None);
    plain.update(batch(vec![det_jump()]), None);
    assert_eq!(plain.tracks().len(), 1);

    let gated_config = TrackerConfig {
        gate_filtering: true,
        ..TrackerConfig::default()
    };
    let mut gated = TrackRegistry::new(gated_config).unwrap();
    gated.update(batch(vec![det_start()]), None);
    gated.update(batch(vec![det_jump()]), None);
    // The gate vetoes the pair, so the jump spawns a second track.
    assert_eq!(gated.tracks().len(), 2);
}

#[test]
fn test_greedy_strategy_still_tracks() {
    let config = TrackerConfig::default();
    let motion = Box::new(permatrack_rs::tracker::ConstantVelocity::default());
    let mut registry =
        TrackRegistry::with_strategies(config, motion, Box::new(Greedy)).unwrap();

    let det = || Detection::new(10.0, 10.0, 50.0, 50.0, 0.9);
    let first = registry.update(batch(vec![det()]), None);
    let second = registry.update(batch(vec![det()]), None);
    assert_eq!(first[0].track_id, second[0].track_id);
    assert_eq!(second[0].hits, 2);
}

#[test]
fn test_feature_carried_into_records() {
    let mut registry = TrackRegistry::new(TrackerConfig::default()).unwrap();
    let records = registry.update(
        batch(vec![
            Detection::new(0.0, 0.0, 10.0, 10.0, 0.9).with_feature(vec![0.6, 0.8]),
        ]),
        None,
    );
    assert_eq!(records[0].feature.as_deref(), Some(&[0.6, 0.8][..]));

    // The record mirrors the most recent detection, which had no feature.
    let records = registry.update(batch(vec![Detection::new(0.0, 0.0, 10.0, 10.0, 0.9)]), None);
    assert!(records[0].feature.is_none());
}

#[test]
fn test_invalid_config_rejected_at_construction() {
    let config = TrackerConfig {
        min_probability: 0.0,
        ..TrackerConfig::default()
    };
    assert!(TrackRegistry::new(config).is_err());
}
