//! K-medoids clustering over a precomputed distance matrix.
//!
//! Used to find load centroids among demand sources: medoids are real
//! nodes, so a medoid set maps directly to candidate replica sites.
//!
//! # Algorithm
//!
//! 1. Initial medoids: the `k` points with the smallest normalized
//!    centrality `v_j = Σ_i d(i, j) / Σ_l d(i, l)` (Park & Jun, 2009)
//! 2. Assign every point to its nearest medoid
//! 3. Replace each medoid by the cluster member with minimal total
//!    distance to the rest of its cluster
//! 4. Repeat 2–3 until the medoids are stable or `max_iterations`
//!
//! Cluster counts are compared with the silhouette coefficient
//! (Rousseeuw, 1987); see [`best_by_silhouette`].

mod silhouette;

pub use silhouette::silhouette_score;

/// K-medoids clusterer.
///
/// # Examples
///
/// ```
/// use u_placement::kmedoids::KMedoids;
///
/// let d = vec![
///     vec![0.0, 1.0, 2.0],
///     vec![1.0, 0.0, 1.0],
///     vec![2.0, 1.0, 0.0],
/// ];
/// let result = KMedoids::new(1).fit(&d);
/// assert_eq!(result.medoids, vec![1]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KMedoids {
    pub nb_clusters: usize,
    pub max_iterations: usize,
}

/// Outcome of a clustering run.
#[derive(Debug, Clone, PartialEq)]
pub struct KMedoidsResult {
    /// Point index of each medoid; `labels` refer to positions in this vector.
    pub medoids: Vec<usize>,
    /// Cluster of each point.
    pub labels: Vec<usize>,
    /// Sum of distances from every point to its medoid.
    pub cost: f64,
    pub iterations: usize,
}

impl KMedoids {
    pub fn new(nb_clusters: usize) -> Self {
        Self {
            nb_clusters,
            max_iterations: 100,
        }
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Clusters the points of a square distance matrix.
    ///
    /// The cluster count is clamped to `[1, n]`. An empty matrix yields
    /// an empty result.
    pub fn fit(&self, distances: &[Vec<f64>]) -> KMedoidsResult {
        let n = distances.len();
        if n == 0 {
            return KMedoidsResult {
                medoids: Vec::new(),
                labels: Vec::new(),
                cost: 0.0,
                iterations: 0,
            };
        }
        let k = self.nb_clusters.clamp(1, n);

        let mut medoids = initial_medoids(distances, k);
        let mut labels = assign(distances, &medoids);
        let mut iterations = 0;

        while iterations < self.max_iterations {
            iterations += 1;
            let updated = update_medoids(distances, &medoids, &labels);
            if updated == medoids {
                break;
            }
            medoids = updated;
            labels = assign(distances, &medoids);
        }

        let cost = labels
            .iter()
            .enumerate()
            .map(|(i, &c)| distances[i][medoids[c]])
            .sum();

        KMedoidsResult {
            medoids,
            labels,
            cost,
            iterations,
        }
    }
}

/// Tries every cluster count in `min_k..=max_k` and keeps the result
/// with the highest silhouette score. Earlier (smaller) counts win ties.
///
/// Returns `None` for an empty matrix or an empty range.
pub fn best_by_silhouette(
    distances: &[Vec<f64>],
    min_k: usize,
    max_k: usize,
    max_iterations: usize,
) -> Option<(KMedoidsResult, f64)> {
    let n = distances.len();
    if n == 0 {
        return None;
    }
    let lo = min_k.max(1);
    let hi = max_k.min(n);
    let mut best: Option<(KMedoidsResult, f64)> = None;
    for k in lo..=hi {
        let result = KMedoids::new(k).with_max_iterations(max_iterations).fit(distances);
        let score = silhouette_score(distances, &result.labels);
        if best.as_ref().map_or(true, |(_, s)| score > *s) {
            best = Some((result, score));
        }
    }
    best
}

fn initial_medoids(distances: &[Vec<f64>], k: usize) -> Vec<usize> {
    let n = distances.len();
    let row_sums: Vec<f64> = distances.iter().map(|row| row.iter().sum()).collect();
    let centrality: Vec<f64> = (0..n)
        .map(|j| {
            (0..n)
                .filter(|&i| row_sums[i] > 0.0)
                .map(|i| distances[i][j] / row_sums[i])
                .sum()
        })
        .collect();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| centrality[a].total_cmp(&centrality[b]));
    order.truncate(k);
    order
}

fn assign(distances: &[Vec<f64>], medoids: &[usize]) -> Vec<usize> {
    distances
        .iter()
        .map(|row| {
            medoids
                .iter()
                .enumerate()
                .min_by(|(_, &a), (_, &b)| row[a].total_cmp(&row[b]))
                .map_or(0, |(c, _)| c)
        })
        .collect()
}

fn update_medoids(distances: &[Vec<f64>], medoids: &[usize], labels: &[usize]) -> Vec<usize> {
    medoids
        .iter()
        .enumerate()
        .map(|(c, &current)| {
            let members: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == c).collect();
            let total = |m: usize| members.iter().map(|&i| distances[m][i]).sum::<f64>();
            let mut best = current;
            let mut best_total = total(current);
            for &m in &members {
                let t = total(m);
                if t < best_total {
                    best = m;
                    best_total = t;
                }
            }
            best
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 1.0, 2.0],
            vec![1.0, 0.0, 1.0],
            vec![2.0, 1.0, 0.0],
        ]
    }

    /// Two well-separated groups: {0, 1, 2} and {3, 4}.
    fn two_groups() -> Vec<Vec<f64>> {
        let pos: [f64; 5] = [0.0, 1.0, 2.0, 20.0, 21.0];
        pos.iter()
            .map(|a| pos.iter().map(|b| (a - b).abs()).collect())
            .collect()
    }

    #[test]
    fn test_single_cluster_picks_center() {
        let d = line();
        let result = KMedoids::new(1).fit(&d);
        assert_eq!(result.medoids, vec![1]);
        assert_eq!(result.labels, vec![0, 0, 0]);
        assert!((result.cost - 2.0).abs() < 1e-12);
        assert_eq!(silhouette_score(&d, &result.labels), 0.0);
    }

    #[test]
    fn test_two_groups_found() {
        let d = two_groups();
        let result = KMedoids::new(2).fit(&d);
        assert_eq!(result.labels[0], result.labels[1]);
        assert_eq!(result.labels[1], result.labels[2]);
        assert_eq!(result.labels[3], result.labels[4]);
        assert_ne!(result.labels[0], result.labels[3]);
        assert!(result.medoids.contains(&1));
    }

    #[test]
    fn test_silhouette_selects_two() {
        let d = two_groups();
        let (result, score) = best_by_silhouette(&d, 1, 4, 50).unwrap();
        assert_eq!(result.medoids.len(), 2);
        assert!(score > 0.8, "expected well-separated score, got {score}");
    }

    #[test]
    fn test_k_clamped_to_point_count() {
        let d = line();
        let result = KMedoids::new(10).fit(&d);
        assert_eq!(result.medoids.len(), 3);
        assert_eq!(result.cost, 0.0);
    }

    #[test]
    fn test_empty_input() {
        let result = KMedoids::new(2).fit(&[]);
        assert!(result.medoids.is_empty());
        assert!(best_by_silhouette(&[], 1, 3, 10).is_none());
    }

    #[test]
    fn test_zero_iterations_keeps_initial_medoids() {
        let d = line();
        let result = KMedoids::new(1).with_max_iterations(0).fit(&d);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.medoids, vec![1]);
    }
}
