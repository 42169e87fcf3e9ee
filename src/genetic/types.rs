//! Core trait and individual representation.

use rand::Rng;

use super::dominance::sanitize;

/// Problem contract for the genetic engine.
///
/// Chromosomes are random-key vectors of `f64` in `[0, 1]` of length
/// [`chromosome_length`](Operator::chromosome_length). The engine owns
/// population management (elite copy, mutant injection, biased
/// crossover, ranking); the operator only maps keys to decisions and
/// decisions to objective vectors.
///
/// # Thread Safety
///
/// `evaluate` may be called concurrently from a worker pool. It must be
/// a pure function of the keys: each call builds its own decision and
/// never mutates shared state.
pub trait Operator: Send + Sync {
    /// The concrete decision a chromosome decodes to.
    type Decision;

    /// Number of random keys per chromosome.
    fn chromosome_length(&self) -> usize;

    /// Decodes a chromosome into a decision.
    fn decode(&self, keys: &[f64]) -> Self::Decision;

    /// Returns the objective vector of a chromosome. Lower is better in
    /// every component. Single-objective operators return one value.
    fn evaluate(&self, keys: &[f64]) -> Vec<f64>;

    /// Heuristic chromosomes injected into the first population.
    ///
    /// The default returns none (purely random start).
    fn seed_population<R: Rng>(&self, _rng: &mut R) -> Vec<Vec<f64>> {
        Vec::new()
    }

    /// Operator-specific stopping criterion, checked before each
    /// generation on the ranked population. The default never stops.
    fn should_stop(&self, _generation: usize, _population: &[Individual]) -> bool {
        false
    }
}

/// A chromosome with its cached objective vector.
///
/// The cache is cleared whenever the keys are modified through
/// [`keys_mut`](Individual::keys_mut).
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    keys: Vec<f64>,
    fitness: Option<Vec<f64>>,
}

impl Individual {
    /// Creates an unevaluated individual. Keys are clamped to `[0, 1]`;
    /// `NaN` keys become 0.
    pub fn new(mut keys: Vec<f64>) -> Self {
        for k in &mut keys {
            *k = if k.is_nan() { 0.0 } else { k.clamp(0.0, 1.0) };
        }
        Self {
            keys,
            fitness: None,
        }
    }

    pub fn keys(&self) -> &[f64] {
        &self.keys
    }

    pub fn into_keys(self) -> Vec<f64> {
        self.keys
    }

    /// Mutable access to the keys. Invalidates the cached fitness.
    pub fn keys_mut(&mut self) -> &mut Vec<f64> {
        self.fitness = None;
        &mut self.keys
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// Cached objective vector, if evaluated.
    pub fn fitness(&self) -> Option<&[f64]> {
        self.fitness.as_deref()
    }

    pub fn set_fitness(&mut self, fitness: Vec<f64>) {
        self.fitness = Some(fitness);
    }

    /// Objective vector used for ranking. A vector containing `NaN` is
    /// degenerate and reads as `+∞` in every component, so any finite
    /// vector dominates it; unevaluated individuals read as a single `+∞`.
    pub fn objectives(&self) -> Vec<f64> {
        match &self.fitness {
            Some(f) if f.iter().any(|v| v.is_nan()) => vec![f64::INFINITY; f.len()],
            Some(f) => f.clone(),
            None => vec![f64::INFINITY],
        }
    }

    /// Scalar view used for single-objective ranking and statistics:
    /// the sum of the sanitized objective vector.
    pub fn scalar(&self) -> f64 {
        match &self.fitness {
            Some(f) if !f.is_empty() => f.iter().copied().map(sanitize).sum(),
            _ => f64::INFINITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_clamped() {
        let ind = Individual::new(vec![-0.5, 0.3, 1.7, f64::NAN]);
        assert_eq!(ind.keys(), &[0.0, 0.3, 1.0, 0.0]);
        assert!(!ind.is_evaluated());
    }

    #[test]
    fn test_mutation_invalidates_fitness() {
        let mut ind = Individual::new(vec![0.1, 0.2]);
        ind.set_fitness(vec![1.0, 2.0]);
        assert_eq!(ind.fitness(), Some(&[1.0, 2.0][..]));
        assert_eq!(ind.scalar(), 3.0);

        ind.keys_mut()[0] = 0.9;
        assert!(!ind.is_evaluated());
        assert!(ind.scalar().is_infinite());
    }

    #[test]
    fn test_nan_fitness_reads_as_worst() {
        let mut ind = Individual::new(vec![0.5]);
        ind.set_fitness(vec![f64::NAN, 1.0]);
        assert_eq!(ind.objectives(), vec![f64::INFINITY, f64::INFINITY]);
        assert!(ind.scalar().is_infinite());
    }
}
