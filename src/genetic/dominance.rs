//! Dominance relations between objective vectors.
//!
//! All objectives are minimized. Non-finite components are treated as
//! the worst possible value: `NaN` is read as `+∞` so comparisons never
//! panic and degenerate individuals sink to the last front.

/// How two objective vectors are compared during ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DominanceKind {
    /// Classic Pareto dominance over all components.
    Pareto,
    /// First component decides unless both are within `tolerance`, in
    /// which case Pareto dominance on the remaining components decides.
    Preferred { tolerance: f64 },
}

impl Default for DominanceKind {
    fn default() -> Self {
        DominanceKind::Preferred { tolerance: 0.01 }
    }
}

impl DominanceKind {
    /// Returns `true` if `a` dominates `b` under this relation.
    pub fn dominates(&self, a: &[f64], b: &[f64]) -> bool {
        match *self {
            DominanceKind::Pareto => pareto_dominates(a, b),
            DominanceKind::Preferred { tolerance } => preferred_dominates(a, b, tolerance),
        }
    }
}

/// Maps `NaN` to `+∞`; every other value is returned unchanged.
#[inline]
pub fn sanitize(v: f64) -> f64 {
    if v.is_nan() {
        f64::INFINITY
    } else {
        v
    }
}

/// Pareto dominance: every component of `a` is `<=` the matching
/// component of `b` and at least one is strictly smaller.
///
/// # Example
///
/// ```
/// use u_placement::genetic::pareto_dominates;
///
/// assert!(pareto_dominates(&[1.0, 2.0], &[1.0, 3.0]));
/// assert!(!pareto_dominates(&[1.0, 4.0], &[2.0, 3.0]));
/// assert!(!pareto_dominates(&[1.0, 2.0], &[1.0, 2.0]));
/// ```
pub fn pareto_dominates(a: &[f64], b: &[f64]) -> bool {
    let mut strictly_better = false;
    for (&va, &vb) in a.iter().zip(b.iter()) {
        let (va, vb) = (sanitize(va), sanitize(vb));
        if va > vb {
            return false;
        }
        if va < vb {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Tolerance-based lexicographic dominance.
///
/// The first component (deadline violation by convention) is primary.
/// When `|a[0] - b[0]| <= tolerance` the vectors are compared by Pareto
/// dominance on the remaining components; otherwise the smaller first
/// component dominates regardless of the rest.
///
/// # Example
///
/// ```
/// use u_placement::genetic::preferred_dominates;
///
/// assert!(preferred_dominates(&[0.5, 10.0], &[0.5, 20.0], 0.01));
/// assert!(preferred_dominates(&[0.1, 50.0], &[0.5, 1.0], 0.01));
/// ```
pub fn preferred_dominates(a: &[f64], b: &[f64], tolerance: f64) -> bool {
    let (Some(&a0), Some(&b0)) = (a.first(), b.first()) else {
        return false;
    };
    let (a0, b0) = (sanitize(a0), sanitize(b0));
    let tied = a0 == b0 || (a0 - b0).abs() <= tolerance;
    if tied {
        pareto_dominates(&a[1..], &b[1..])
    } else {
        a0 < b0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pareto_basic() {
        assert!(pareto_dominates(&[1.0, 1.0], &[2.0, 2.0]));
        assert!(!pareto_dominates(&[2.0, 2.0], &[1.0, 1.0]));
        assert!(!pareto_dominates(&[1.0, 3.0], &[3.0, 1.0]));
        assert!(!pareto_dominates(&[3.0, 1.0], &[1.0, 3.0]));
    }

    #[test]
    fn test_pareto_nan_is_worst() {
        assert!(pareto_dominates(&[1.0, 1.0], &[f64::NAN, 1.0]));
        assert!(!pareto_dominates(&[f64::NAN, 1.0], &[1.0, 1.0]));
        assert!(!pareto_dominates(&[f64::NAN], &[f64::NAN]));
    }

    #[test]
    fn test_preferred_tie_falls_back_to_pareto() {
        assert!(preferred_dominates(&[0.5, 10.0], &[0.5, 20.0], 0.01));
        assert!(preferred_dominates(&[0.505, 10.0], &[0.5, 20.0], 0.01));
        assert!(!preferred_dominates(&[0.5, 20.0], &[0.5, 10.0], 0.01));
    }

    #[test]
    fn test_preferred_primary_wins() {
        assert!(preferred_dominates(&[0.1, 50.0], &[0.5, 1.0], 0.01));
        assert!(!preferred_dominates(&[0.5, 1.0], &[0.1, 50.0], 0.01));
    }

    #[test]
    fn test_preferred_infinite_primary_ties() {
        let inf = f64::INFINITY;
        assert!(preferred_dominates(&[inf, 1.0], &[inf, 2.0], 0.01));
        assert!(preferred_dominates(&[1.0, 9.0], &[f64::NAN, 0.0], 0.01));
    }

    #[test]
    fn test_preferred_empty_vectors() {
        assert!(!preferred_dominates(&[], &[], 0.01));
        assert!(!preferred_dominates(&[1.0], &[1.0], 0.01));
    }

    #[test]
    fn test_kind_dispatch() {
        let a = [0.1, 50.0];
        let b = [0.5, 1.0];
        assert!(!DominanceKind::Pareto.dominates(&a, &b));
        assert!(DominanceKind::Preferred { tolerance: 0.01 }.dominates(&a, &b));
    }

    fn objective() -> impl Strategy<Value = f64> {
        prop_oneof![
            8 => -10.0..10.0f64,
            1 => Just(f64::NAN),
            1 => Just(f64::INFINITY),
        ]
    }

    proptest! {
        #[test]
        fn prop_pareto_antisymmetric(
            a in prop::collection::vec(objective(), 3),
            b in prop::collection::vec(objective(), 3),
        ) {
            prop_assert!(!(pareto_dominates(&a, &b) && pareto_dominates(&b, &a)));
        }

        #[test]
        fn prop_preferred_antisymmetric(
            a in prop::collection::vec(objective(), 3),
            b in prop::collection::vec(objective(), 3),
            tol in 0.0..1.0f64,
        ) {
            prop_assert!(!(preferred_dominates(&a, &b, tol) && preferred_dominates(&b, &a, tol)));
        }

        #[test]
        fn prop_nothing_dominates_itself(a in prop::collection::vec(objective(), 3)) {
            prop_assert!(!pareto_dominates(&a, &a));
            prop_assert!(!preferred_dominates(&a, &a, 0.01));
        }
    }
}
