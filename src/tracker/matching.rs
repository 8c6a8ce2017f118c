//! Matching utilities: center-distance costs and greedy assignment.

use std::cmp::Ordering;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::tracker::rect::Rect;

/// How detections in one frame may share a previous trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// One-to-one. Pairs within tolerance are claimed by ascending distance
    /// (ties: lower identity, then earlier detection); once a trace or a
    /// detection is claimed it drops out of the pool.
    #[default]
    Exclusive,
    /// Many-to-one. Every detection independently picks its nearest trace,
    /// so one trace may gain several entries in a single frame.
    Shared,
}

/// Compute the center-distance matrix between trace candidates (rows) and
/// detections (columns).
pub fn center_distance(candidates: &[Rect], detections: &[Rect]) -> Array2<f64> {
    let mut dists = Array2::zeros((candidates.len(), detections.len()));
    for (i, c) in candidates.iter().enumerate() {
        for (j, d) in detections.iter().enumerate() {
            dists[[i, j]] = c.distance_to(d);
        }
    }
    dists
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentResult {
    /// `(candidate row, detection column)`, ordered by detection column
    pub matches: Vec<(usize, usize)>,
    /// Detection columns with no candidate within tolerance, ascending
    pub unmatched_detections: Vec<usize>,
}

/// Assign detections to candidates whose distance is at most `tolerance`.
///
/// Rows must be ordered by ascending identity; on equal distance the lower
/// row wins.
pub fn greedy_assignment(
    cost_matrix: &Array2<f64>,
    tolerance: f64,
    policy: MatchPolicy,
) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_detections: (0..num_cols).collect(),
        };
    }

    let mut assigned: Vec<Option<usize>> = vec![None; num_cols];

    match policy {
        MatchPolicy::Exclusive => {
            let mut pairs = Vec::new();
            for ((row, col), &dist) in cost_matrix.indexed_iter() {
                if dist <= tolerance {
                    pairs.push((dist, row, col));
                }
            }
            pairs.sort_by(|a, b| {
                a.0.total_cmp(&b.0)
                    .then_with(|| a.1.cmp(&b.1))
                    .then_with(|| a.2.cmp(&b.2))
            });

            let mut row_taken = vec![false; num_rows];
            for (_, row, col) in pairs {
                if row_taken[row] || assigned[col].is_some() {
                    continue;
                }
                row_taken[row] = true;
                assigned[col] = Some(row);
            }
        }
        MatchPolicy::Shared => {
            for (col, slot) in assigned.iter_mut().enumerate() {
                let mut best: Option<(usize, f64)> = None;
                for row in 0..num_rows {
                    let dist = cost_matrix[[row, col]];
                    if dist > tolerance {
                        continue;
                    }
                    let closer = match best {
                        None => true,
                        Some((_, best_dist)) => dist.total_cmp(&best_dist) == Ordering::Less,
                    };
                    if closer {
                        best = Some((row, dist));
                    }
                }
                *slot = best.map(|(row, _)| row);
            }
        }
    }

    let mut matches = Vec::new();
    let mut unmatched_detections = Vec::new();
    for (col, row) in assigned.into_iter().enumerate() {
        match row {
            Some(row) => matches.push((row, col)),
            None => unmatched_detections.push(col),
        }
    }

    AssignmentResult {
        matches,
        unmatched_detections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rects(centers: &[(i32, i32)]) -> Vec<Rect> {
        centers
            .iter()
            .map(|&(cx, cy)| Rect::new(cx - 5, cy - 5, 10, 10))
            .collect()
    }

    #[test]
    fn test_center_distance_shape() {
        let dists = center_distance(&rects(&[(0, 0), (10, 0)]), &rects(&[(3, 4)]));
        assert_eq!(dists.dim(), (2, 1));
        assert!((dists[[0, 0]] - 5.0).abs() < 1e-9);
        assert!((dists[[1, 0]] - 65.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_no_candidates() {
        let dists = center_distance(&[], &rects(&[(0, 0), (1, 1)]));
        let result = greedy_assignment(&dists, 10.0, MatchPolicy::Exclusive);
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched_detections, vec![0, 1]);
    }

    #[test]
    fn test_tolerance_is_inclusive() {
        let dists = center_distance(&rects(&[(0, 0)]), &rects(&[(10, 0), (0, 11)]));
        let result = greedy_assignment(&dists, 10.0, MatchPolicy::Shared);
        assert_eq!(result.matches, vec![(0, 0)]);
        assert_eq!(result.unmatched_detections, vec![1]);
    }

    #[test]
    fn test_exclusive_gives_candidate_to_nearest_detection() {
        // Both detections are within tolerance of the single candidate;
        // the second is closer and claims it.
        let dists = center_distance(&rects(&[(0, 0)]), &rects(&[(6, 0), (2, 0)]));
        let result = greedy_assignment(&dists, 10.0, MatchPolicy::Exclusive);
        assert_eq!(result.matches, vec![(0, 1)]);
        assert_eq!(result.unmatched_detections, vec![0]);
    }

    #[test]
    fn test_exclusive_falls_back_to_second_nearest() {
        let dists = center_distance(&rects(&[(0, 0), (8, 0)]), &rects(&[(3, 0), (4, 0)]));
        let result = greedy_assignment(&dists, 10.0, MatchPolicy::Exclusive);
        // (row 0, col 0) at distance 3 is claimed first; col 1 takes row 1 at 4.
        assert_eq!(result.matches, vec![(0, 0), (1, 1)]);
        assert!(result.unmatched_detections.is_empty());
    }

    #[test]
    fn test_shared_lets_detections_share_candidate() {
        let dists = center_distance(&rects(&[(0, 0)]), &rects(&[(6, 0), (2, 0)]));
        let result = greedy_assignment(&dists, 10.0, MatchPolicy::Shared);
        assert_eq!(result.matches, vec![(0, 0), (0, 1)]);
        assert!(result.unmatched_detections.is_empty());
    }

    #[test]
    fn test_equal_distance_prefers_lower_row() {
        let dists = center_distance(&rects(&[(0, 0), (10, 0)]), &rects(&[(5, 0)]));
        for policy in [MatchPolicy::Exclusive, MatchPolicy::Shared] {
            let result = greedy_assignment(&dists, 10.0, policy);
            assert_eq!(result.matches, vec![(0, 0)]);
        }
    }
}
