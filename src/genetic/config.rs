//! Genetic engine configuration.

use crate::error::{PlacementError, Result};

/// Configuration for the biased random-key genetic engine.
///
/// # Parameters
///
/// The population fractions must satisfy
/// `elite_fraction + mutant_fraction < 1.0`; the rest of each
/// generation is filled by biased crossover offspring.
///
/// # Examples
///
/// ```
/// use u_placement::genetic::GeneticConfig;
///
/// let config = GeneticConfig::default()
///     .with_population_size(80)
///     .with_max_generations(200)
///     .with_elite_fraction(0.25)
///     .with_mutant_fraction(0.10)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneticConfig {
    /// Total population size. Zero yields an empty result.
    pub population_size: usize,

    /// Maximum number of generations after the initial population.
    pub max_generations: usize,

    /// Fraction of population copied unchanged (0.10–0.25 typical).
    pub elite_fraction: f64,

    /// Fraction of population replaced by random mutants (0.10–0.30 typical).
    pub mutant_fraction: f64,

    /// Probability that offspring inherits the elite parent's key
    /// during biased uniform crossover (0.55–0.80 typical).
    pub elite_inheritance_prob: f64,

    /// Number of most recent best values inspected by the stall check.
    /// Set to 0 to disable.
    pub stall_window: usize,

    /// Variance of the best values over the window at or below which
    /// the run is considered stalled.
    pub stall_threshold: f64,

    /// Whether to evaluate individuals on a worker pool.
    pub parallel: bool,

    /// Worker count. `None` uses rayon's global pool.
    pub pool_size: Option<usize>,

    /// Random seed for reproducibility. `None` draws one.
    pub seed: Option<u64>,

    /// Optional wall-clock guard in milliseconds, checked before each
    /// generation. The best-so-far population is returned when it trips.
    pub time_limit_ms: Option<u64>,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            max_generations: 100,
            elite_fraction: 0.20,
            mutant_fraction: 0.15,
            elite_inheritance_prob: 0.70,
            stall_window: 10,
            stall_threshold: 1e-6,
            parallel: true,
            pool_size: None,
            seed: None,
            time_limit_ms: None,
        }
    }
}

impl GeneticConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    pub fn with_elite_fraction(mut self, f: f64) -> Self {
        self.elite_fraction = f.clamp(0.0, 1.0);
        self
    }

    pub fn with_mutant_fraction(mut self, f: f64) -> Self {
        self.mutant_fraction = f.clamp(0.0, 1.0);
        self
    }

    pub fn with_elite_inheritance_prob(mut self, p: f64) -> Self {
        self.elite_inheritance_prob = p.clamp(0.5, 1.0);
        self
    }

    /// Sets the stall window (0 disables stall detection).
    pub fn with_stall_window(mut self, n: usize) -> Self {
        self.stall_window = n;
        self
    }

    pub fn with_stall_threshold(mut self, variance: f64) -> Self {
        self.stall_threshold = variance.max(0.0);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_pool_size(mut self, workers: usize) -> Self {
        self.pool_size = Some(workers);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Number of elites per generation (at least one for a non-empty population).
    pub fn elite_count(&self) -> usize {
        let n = (self.population_size as f64 * self.elite_fraction) as usize;
        n.clamp(1, self.population_size.max(1)).min(self.population_size)
    }

    /// Number of fresh random individuals per generation.
    pub fn mutant_count(&self) -> usize {
        let n = (self.population_size as f64 * self.mutant_fraction) as usize;
        n.min(self.population_size - self.elite_count())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.elite_fraction <= 0.0 {
            return Err(PlacementError::InvalidConfig("elite_fraction must be positive".into()));
        }
        if self.elite_fraction + self.mutant_fraction >= 1.0 {
            return Err(PlacementError::InvalidConfig(format!(
                "elite_fraction ({}) + mutant_fraction ({}) must be < 1.0",
                self.elite_fraction, self.mutant_fraction
            )));
        }
        if self.elite_inheritance_prob <= 0.5 || self.elite_inheritance_prob > 1.0 {
            return Err(PlacementError::InvalidConfig(
                "elite_inheritance_prob must be in (0.5, 1.0]".into(),
            ));
        }
        if self.stall_threshold.is_nan() {
            return Err(PlacementError::InvalidConfig("stall_threshold must be a number".into()));
        }
        if self.pool_size == Some(0) {
            return Err(PlacementError::InvalidConfig("pool_size must be positive or None".into()));
        }
        if self.time_limit_ms == Some(0) {
            return Err(PlacementError::InvalidConfig(
                "time_limit_ms must be positive or None".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeneticConfig::default();
        assert_eq!(config.population_size, 50);
        assert_eq!(config.max_generations, 100);
        assert!((config.elite_fraction - 0.20).abs() < 1e-10);
        assert!((config.mutant_fraction - 0.15).abs() < 1e-10);
        assert!((config.elite_inheritance_prob - 0.70).abs() < 1e-10);
        assert!(config.parallel);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_counts() {
        let config = GeneticConfig::default().with_population_size(20);
        assert_eq!(config.elite_count(), 4);
        assert_eq!(config.mutant_count(), 3);

        let tiny = GeneticConfig::default().with_population_size(2);
        assert_eq!(tiny.elite_count(), 1);
        assert_eq!(tiny.mutant_count(), 0);

        let empty = GeneticConfig::default().with_population_size(0);
        assert_eq!(empty.elite_count(), 0);
        assert_eq!(empty.mutant_count(), 0);
    }

    #[test]
    fn test_validate_fractions_sum() {
        let config = GeneticConfig::default()
            .with_elite_fraction(0.6)
            .with_mutant_fraction(0.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_pool_and_time() {
        assert!(GeneticConfig::default().with_pool_size(0).validate().is_err());
        assert!(GeneticConfig::default().with_time_limit_ms(0).validate().is_err());
        assert!(GeneticConfig::default().with_pool_size(2).validate().is_ok());
    }

    #[test]
    fn test_clamp_inheritance() {
        let config = GeneticConfig::default().with_elite_inheritance_prob(0.3);
        assert!((config.elite_inheritance_prob - 0.5).abs() < 1e-10);
        assert!(config.validate().is_err());
    }
}
