//! Silhouette coefficient.

/// Mean silhouette coefficient of a labelling.
///
/// For each point, `s = (b - a) / max(a, b)` where `a` is the mean
/// distance to the other members of its cluster and `b` the smallest
/// mean distance to the members of another cluster. Points alone in
/// their cluster score 0. Returns 0 when there are fewer than two
/// points or fewer than two clusters.
pub fn silhouette_score(distances: &[Vec<f64>], labels: &[usize]) -> f64 {
    let n = labels.len();
    if n < 2 {
        return 0.0;
    }
    let nb_clusters = labels.iter().max().map_or(0, |&m| m + 1);
    let mut sizes = vec![0usize; nb_clusters];
    for &l in labels {
        sizes[l] += 1;
    }
    if sizes.iter().filter(|&&s| s > 0).count() < 2 {
        return 0.0;
    }

    let mut total = 0.0;
    for i in 0..n {
        let own = labels[i];
        if sizes[own] <= 1 {
            continue;
        }
        let mut sums = vec![0.0; nb_clusters];
        for j in 0..n {
            if i != j {
                sums[labels[j]] += distances[i][j];
            }
        }
        let a = sums[own] / (sizes[own] - 1) as f64;
        let b = (0..nb_clusters)
            .filter(|&c| c != own && sizes[c] > 0)
            .map(|c| sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);
        let denom = a.max(b);
        if denom > 0.0 && denom.is_finite() {
            total += (b - a) / denom;
        }
    }
    total / n as f64
}
