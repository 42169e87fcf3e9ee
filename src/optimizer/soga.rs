//! Single-objective genetic optimizer.

use tracing::info;

use crate::error::Result;
use crate::genetic::{GeneticResult, Ranking};
use crate::model::{EnvironmentInput, OptSolution, System};

use super::config::OptimizerConfig;
use super::search::{finalize, run_stage, WarmStart};
use super::Optimizer;

/// BRKGA over the weighted sum of the configured objectives.
#[derive(Debug, Clone, Default)]
pub struct SogaOptimizer {
    config: OptimizerConfig,
    warm: WarmStart,
    last: Option<GeneticResult>,
}

impl SogaOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            config,
            warm: WarmStart::default(),
            last: None,
        }
    }

    /// Statistics of the most recent run.
    pub fn last_result(&self) -> Option<&GeneticResult> {
        self.last.as_ref()
    }
}

impl Optimizer for SogaOptimizer {
    fn name(&self) -> &'static str {
        "soga"
    }

    fn solve(&mut self, system: &System, env: &EnvironmentInput) -> Result<OptSolution> {
        self.config.validate()?;
        env.validate(system)?;
        let (decision, result) = run_stage(
            &self.config,
            Ranking::Scalar,
            Some(self.config.weights()),
            system,
            env,
            self.warm.seeds(self.config.warm_start),
            0,
        )?;
        self.warm.remember(&result, self.config.warm_start);
        info!(
            optimizer = self.name(),
            generations = result.generations,
            stop = ?result.stop_reason,
            best = result.best_history.last().copied().unwrap_or(f64::INFINITY),
            "decision ready"
        );
        self.last = Some(result);
        finalize(self.name(), system, decision)
    }

    fn reset(&mut self) {
        self.warm.clear();
        self.last = None;
    }
}
