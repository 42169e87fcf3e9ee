//! Non-dominated sorting and crowding distance (NSGA-II utilities).
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic Algorithm: NSGA-II"
//! - IEEE Transactions on Evolutionary Computation, 6(2), 182-197

use super::dominance::{sanitize, DominanceKind};

/// Result of non-dominated sorting.
///
/// Each element of `ranks` corresponds to the front index of the
/// solution at the same position. Rank 0 is the non-dominated front.
#[derive(Debug, Clone)]
pub struct NondominatedSortResult {
    /// Front index for each solution (0 = first front).
    pub ranks: Vec<usize>,

    /// Indices grouped by front: `fronts[0]` contains rank-0 indices, etc.
    pub fronts: Vec<Vec<usize>>,
}

/// Fast non-dominated sorting under a configurable dominance relation.
///
/// All objectives are **minimized**. Returns no fronts for an empty
/// input.
///
/// Tolerance-based dominance is not transitive and may form cycles.
/// Solutions caught in a cycle never reach a domination count of zero;
/// they are collected into one trailing front instead of being dropped.
///
/// # Complexity
///
/// O(m * n²) where m = number of objectives, n = number of solutions
///
/// # Example
///
/// ```
/// use u_placement::genetic::{non_dominated_sort, DominanceKind};
///
/// let objectives = vec![
///     vec![1.0, 5.0],
///     vec![3.0, 3.0],
///     vec![5.0, 1.0],
///     vec![4.0, 4.0], // dominated by (3, 3)
/// ];
///
/// let result = non_dominated_sort(&objectives, DominanceKind::Pareto);
/// assert_eq!(result.ranks, vec![0, 0, 0, 1]);
/// ```
pub fn non_dominated_sort(objectives: &[Vec<f64>], dominance: DominanceKind) -> NondominatedSortResult {
    let n = objectives.len();
    if n == 0 {
        return NondominatedSortResult {
            ranks: Vec::new(),
            fronts: Vec::new(),
        };
    }

    let mut domination_count = vec![0usize; n];
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut ranks = vec![usize::MAX; n];

    for i in 0..n {
        for j in (i + 1)..n {
            if dominance.dominates(&objectives[i], &objectives[j]) {
                dominated_by[i].push(j);
                domination_count[j] += 1;
            } else if dominance.dominates(&objectives[j], &objectives[i]) {
                dominated_by[j].push(i);
                domination_count[i] += 1;
            }
        }
    }

    let front_0: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();
    for &i in &front_0 {
        ranks[i] = 0;
    }

    let mut fronts = Vec::new();
    let mut current = front_0;
    while !current.is_empty() {
        let mut next_front = Vec::new();
        for &i in &current {
            for &j in &dominated_by[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    ranks[j] = fronts.len() + 1;
                    next_front.push(j);
                }
            }
        }
        fronts.push(current);
        current = next_front;
    }

    let stranded: Vec<usize> = (0..n).filter(|&i| ranks[i] == usize::MAX).collect();
    if !stranded.is_empty() {
        for &i in &stranded {
            ranks[i] = fronts.len();
        }
        fronts.push(stranded);
    }

    NondominatedSortResult { ranks, fronts }
}

/// Crowding distance assignment for diversity preservation.
///
/// Boundary solutions (min/max for any objective) receive `f64::INFINITY`.
/// Objectives whose range is zero or non-finite contribute nothing.
///
/// # Example
///
/// ```
/// use u_placement::genetic::crowding_distance;
///
/// let objectives = vec![
///     vec![1.0, 5.0],
///     vec![3.0, 3.0],
///     vec![5.0, 1.0],
/// ];
///
/// let distances = crowding_distance(&objectives);
/// assert!(distances[0].is_infinite());
/// assert!(distances[2].is_infinite());
/// assert!(distances[1].is_finite());
/// ```
pub fn crowding_distance(objectives: &[Vec<f64>]) -> Vec<f64> {
    let n = objectives.len();
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }

    let m = objectives[0].len();
    let mut distances = vec![0.0f64; n];

    #[allow(clippy::needless_range_loop)] // obj_idx is a column index into 2D data
    for obj_idx in 0..m {
        let value = |i: usize| sanitize(objectives[i][obj_idx]);
        let mut indices: Vec<usize> = (0..n).collect();
        indices.sort_by(|&a, &b| value(a).total_cmp(&value(b)));

        distances[indices[0]] = f64::INFINITY;
        distances[indices[n - 1]] = f64::INFINITY;

        let range = value(indices[n - 1]) - value(indices[0]);
        if range > 0.0 && range.is_finite() {
            for i in 1..(n - 1) {
                let prev = value(indices[i - 1]);
                let next = value(indices[i + 1]);
                distances[indices[i]] += (next - prev) / range;
            }
        }
    }

    distances
}

/// Orders solutions best-first: by front, then by descending crowding
/// distance within a front. Ties keep their input order.
///
/// Returns the ordering and the size of the first front.
pub fn rank_order(objectives: &[Vec<f64>], dominance: DominanceKind) -> (Vec<usize>, usize) {
    let sorted = non_dominated_sort(objectives, dominance);
    let first_front = sorted.fronts.first().map_or(0, Vec::len);
    let mut order = Vec::with_capacity(objectives.len());
    for front in &sorted.fronts {
        let front_objs: Vec<Vec<f64>> = front.iter().map(|&i| objectives[i].clone()).collect();
        let crowd = crowding_distance(&front_objs);
        let mut local: Vec<usize> = (0..front.len()).collect();
        local.sort_by(|&a, &b| crowd[b].total_cmp(&crowd[a]));
        order.extend(local.into_iter().map(|k| front[k]));
    }
    (order, first_front)
}

// ============================================================================
// Tests
// ============================================================================
