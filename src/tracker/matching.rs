//! Association engine: IoU costs, appearance fusion, gating mask and
//! assignment solving.

use std::cmp::Ordering;

use ndarray::Array2;
use tracing::warn;

use crate::tracker::rect::Rect;

/// Cost assigned to pairs that must never be matched. Also used to pad
/// rectangular matrices to square before the exact solver runs.
pub const INADMISSIBLE: f32 = 1e6;

/// Compute the IoU distance matrix between tracks and detections.
///
/// Cost is `1 - IoU`: identical boxes cost 0, disjoint boxes cost 1.
pub fn iou_distance(track_boxes: &[Rect], det_boxes: &[Rect]) -> Array2<f32> {
    let mut dists = Array2::zeros((track_boxes.len(), det_boxes.len()));
    for (i, t) in track_boxes.iter().enumerate() {
        for (j, d) in det_boxes.iter().enumerate() {
            dists[[i, j]] = 1.0 - t.iou(d);
        }
    }
    dists
}

/// Cosine similarity between two embeddings.
///
/// Zero when either norm vanishes or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

/// Blend appearance dissimilarity into a geometric cost matrix.
///
/// Pairs missing an embedding on either side keep their geometric cost.
pub fn fuse_appearance(
    cost: &mut Array2<f32>,
    track_features: &[Option<Vec<f32>>],
    det_features: &[Option<Vec<f32>>],
    weight: f32,
) {
    let (rows, cols) = cost.dim();
    for i in 0..rows {
        let Some(track_feature) = track_features[i].as_deref() else {
            continue;
        };
        for j in 0..cols {
            if let Some(det_feature) = det_features[j].as_deref() {
                let appearance_cost = 1.0 - cosine_similarity(track_feature, det_feature);
                cost[[i, j]] = (1.0 - weight) * cost[[i, j]] + weight * appearance_cost;
            }
        }
    }
}

/// Mark gate-rejected (track, detection) pairs inadmissible.
pub fn apply_gate(cost: &mut Array2<f32>, rejected: &[(usize, usize)]) {
    for &(row, col) in rejected {
        cost[[row, col]] = INADMISSIBLE;
    }
}

#[derive(Debug, Clone)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Assignment solver over a rectangular cost matrix.
///
/// Implementations return raw row-to-column pairs; the acceptance
/// threshold is applied afterwards by [`associate`].
pub trait AssociationStrategy {
    fn solve(&self, cost: &Array2<f32>) -> Vec<(usize, usize)>;
}

/// Exact solver backed by the Jonker-Volgenant algorithm, guaranteeing a
/// globally optimal one-to-one matching. This is the mandatory default;
/// it only hands over to [`Greedy`] if the solver itself errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hungarian;

impl AssociationStrategy for Hungarian {
    fn solve(&self, cost: &Array2<f32>) -> Vec<(usize, usize)> {
        let (num_rows, num_cols) = cost.dim();
        if num_rows == 0 || num_cols == 0 {
            return vec![];
        }

        let size = num_rows.max(num_cols);
        let mut padded = Array2::<f64>::from_elem((size, size), f64::from(INADMISSIBLE));
        for i in 0..num_rows {
            for j in 0..num_cols {
                padded[[i, j]] = f64::from(cost[[i, j]]);
            }
        }

        match lapjv::lapjv(&padded) {
            Ok((row_to_col, _)) => row_to_col
                .iter()
                .enumerate()
                .filter(|&(row, &col)| row < num_rows && col < num_cols)
                .map(|(row, &col)| (row, col))
                .collect(),
            Err(_) => {
                warn!("exact assignment solver failed, falling back to greedy matching");
                Greedy.solve(cost)
            }
        }
    }
}

/// Greedy lowest-cost-first matching, skipping claimed rows and columns.
///
/// A valid but not necessarily optimal approximation; a degraded mode
/// only, never the default path.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greedy;

impl AssociationStrategy for Greedy {
    fn solve(&self, cost: &Array2<f32>) -> Vec<(usize, usize)> {
        let (rows, cols) = cost.dim();
        let mut entries: Vec<(usize, usize)> = (0..rows)
            .flat_map(|i| (0..cols).map(move |j| (i, j)))
            .collect();
        // Stable sort keeps index order on ties, so the result is
        // deterministic.
        entries.sort_by(|a, b| {
            cost[[a.0, a.1]]
                .partial_cmp(&cost[[b.0, b.1]])
                .unwrap_or(Ordering::Equal)
        });

        let mut taken_rows = vec![false; rows];
        let mut taken_cols = vec![false; cols];
        let mut pairs = Vec::new();
        for (row, col) in entries {
            if taken_rows[row] || taken_cols[col] {
                continue;
            }
            taken_rows[row] = true;
            taken_cols[col] = true;
            pairs.push((row, col));
        }
        pairs
    }
}

/// Solve the assignment and split the result by the acceptance threshold.
///
/// Empty inputs short-circuit to all-unmatched with no computation. A
/// pair is accepted only when its cost is at most `cost_thresh`; both
/// sides of a rejected pair are reported unmatched.
pub fn associate(
    cost: &Array2<f32>,
    cost_thresh: f32,
    strategy: &dyn AssociationStrategy,
) -> AssignmentResult {
    let (num_rows, num_cols) = cost.dim();

    if num_rows == 0 || num_cols == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: (0..num_cols).collect(),
        };
    }

    let mut matches = Vec::new();
    let mut matched_rows = vec![false; num_rows];
    let mut matched_cols = vec![false; num_cols];

    for (row, col) in strategy.solve(cost) {
        if cost[[row, col]] <= cost_thresh {
            matched_rows[row] = true;
            matched_cols[col] = true;
            matches.push((row, col));
        }
    }

    AssignmentResult {
        matches,
        unmatched_tracks: unclaimed(&matched_rows),
        unmatched_detections: unclaimed(&matched_cols),
    }
}

fn unclaimed(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &claimed)| if claimed { None } else { Some(i) })
        .collect()
}
