//! Optimizer configuration.

use crate::error::{PlacementError, Result};
use crate::genetic::{DominanceKind, GeneticConfig};
use crate::metrics::Objective;
use crate::operator::DEFAULT_CHUNK_FRACTION;
use crate::plan::PlanAggregation;

/// Configuration shared by the static optimizers and each stage of the
/// lookahead controller.
///
/// # Examples
///
/// ```
/// use u_placement::metrics::Objective;
/// use u_placement::optimizer::OptimizerConfig;
///
/// let config = OptimizerConfig::default()
///     .with_objectives(vec![Objective::DeadlineViolation, Objective::OperationalCost])
///     .with_chunk_fraction(0.05);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Objectives, all minimized. The first one is primary under
    /// preferred dominance.
    pub objectives: Vec<Objective>,

    pub genetic: GeneticConfig,

    /// Dominance used to rank multi-objective populations.
    pub dominance: DominanceKind,

    /// Share of a source's load handed out per decode step.
    pub chunk_fraction: f64,

    /// Seed the first population with heuristic chromosomes.
    pub use_heuristic_seeds: bool,

    /// Reuse the previous solve's final population as seeds.
    pub warm_start: bool,

    /// Per-objective weights for the single-objective GA (`None` = all 1).
    pub soga_weights: Option<Vec<f64>>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            objectives: vec![
                Objective::DeadlineViolation,
                Objective::OperationalCost,
                Objective::MigrationCost,
            ],
            genetic: GeneticConfig::default(),
            dominance: DominanceKind::default(),
            chunk_fraction: DEFAULT_CHUNK_FRACTION,
            use_heuristic_seeds: true,
            warm_start: true,
            soga_weights: None,
        }
    }
}

impl OptimizerConfig {
    pub fn with_objectives(mut self, objectives: Vec<Objective>) -> Self {
        self.objectives = objectives;
        self
    }

    pub fn with_genetic(mut self, genetic: GeneticConfig) -> Self {
        self.genetic = genetic;
        self
    }

    pub fn with_dominance(mut self, dominance: DominanceKind) -> Self {
        self.dominance = dominance;
        self
    }

    pub fn with_chunk_fraction(mut self, fraction: f64) -> Self {
        self.chunk_fraction = fraction;
        self
    }

    pub fn with_heuristic_seeds(mut self, enabled: bool) -> Self {
        self.use_heuristic_seeds = enabled;
        self
    }

    pub fn with_warm_start(mut self, enabled: bool) -> Self {
        self.warm_start = enabled;
        self
    }

    pub fn with_soga_weights(mut self, weights: Vec<f64>) -> Self {
        self.soga_weights = Some(weights);
        self
    }

    /// Weights applied by the single-objective GA.
    pub fn weights(&self) -> Vec<f64> {
        self.soga_weights
            .clone()
            .unwrap_or_else(|| vec![1.0; self.objectives.len()])
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.genetic.validate()?;
        if self.objectives.is_empty() {
            return Err(PlacementError::InvalidConfig("at least one objective is required".into()));
        }
        if !(self.chunk_fraction > 0.0 && self.chunk_fraction <= 1.0) {
            return Err(PlacementError::InvalidConfig(format!(
                "chunk_fraction must be in (0, 1], got {}",
                self.chunk_fraction
            )));
        }
        if let DominanceKind::Preferred { tolerance } = self.dominance {
            if tolerance.is_nan() || tolerance < 0.0 {
                return Err(PlacementError::InvalidConfig(format!(
                    "dominance tolerance must be non-negative, got {tolerance}"
                )));
            }
        }
        if let Some(w) = &self.soga_weights {
            if w.len() != self.objectives.len() {
                return Err(PlacementError::InvalidConfig(format!(
                    "{} weights for {} objectives",
                    w.len(),
                    self.objectives.len()
                )));
            }
            if w.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(PlacementError::InvalidConfig(
                    "objective weights must be finite and non-negative".into(),
                ));
            }
        }
        Ok(())
    }
}

/// What the lookahead controller does when the predictor returns fewer
/// inputs than the prediction window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredictionShortfall {
    /// Drop the lookahead and behave like the single-stage optimizer.
    #[default]
    Disable,
    /// Look ahead over whatever the predictor returned.
    Truncate,
}

/// Search strategy over stage-candidate tuples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanFinderKind {
    /// Random-key GA over index tuples, reusing the genetic engine.
    #[default]
    Genetic,
    /// Stage-by-stage beam search keeping `width` partial plans.
    Beam { width: usize },
    /// Uniformly sampled tuples.
    Random { samples: usize },
}

/// Configuration of the multi-stage lookahead controller.
#[derive(Debug, Clone)]
pub struct LlcConfig {
    /// Per-stage optimizer settings.
    pub base: OptimizerConfig,

    /// Number of future epochs searched ahead (H).
    pub prediction_window: usize,

    pub shortfall: PredictionShortfall,

    pub plan_finder: PlanFinderKind,

    /// Reduction of per-stage fitness into a plan fitness.
    pub aggregation: PlanAggregation,

    /// Add constant plans built from blended heuristic seeds.
    pub merge_heuristics: bool,
}

impl Default for LlcConfig {
    fn default() -> Self {
        Self {
            base: OptimizerConfig::default(),
            prediction_window: 2,
            shortfall: PredictionShortfall::default(),
            plan_finder: PlanFinderKind::default(),
            aggregation: PlanAggregation::default(),
            merge_heuristics: true,
        }
    }
}

impl LlcConfig {
    pub fn with_base(mut self, base: OptimizerConfig) -> Self {
        self.base = base;
        self
    }

    pub fn with_prediction_window(mut self, window: usize) -> Self {
        self.prediction_window = window;
        self
    }

    pub fn with_shortfall(mut self, shortfall: PredictionShortfall) -> Self {
        self.shortfall = shortfall;
        self
    }

    pub fn with_plan_finder(mut self, kind: PlanFinderKind) -> Self {
        self.plan_finder = kind;
        self
    }

    pub fn with_aggregation(mut self, aggregation: PlanAggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_merge_heuristics(mut self, enabled: bool) -> Self {
        self.merge_heuristics = enabled;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.base.validate()?;
        self.aggregation.validate()?;
        match self.plan_finder {
            PlanFinderKind::Beam { width: 0 } => {
                Err(PlacementError::InvalidConfig("beam width must be positive".into()))
            }
            PlanFinderKind::Random { samples: 0 } => {
                Err(PlacementError::InvalidConfig("random plan samples must be positive".into()))
            }
            _ => Ok(()),
        }
    }
}
