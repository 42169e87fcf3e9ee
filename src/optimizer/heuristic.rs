//! Heuristic-only optimizer.

use tracing::info;

use crate::error::Result;
use crate::genetic::Ranking;
use crate::model::{EnvironmentInput, OptSolution, System};
use crate::operator::{heuristic_chromosomes, merged_chromosomes, Chromosome, PlacementOperator};

use super::config::OptimizerConfig;
use super::search::{best_of, finalize};
use super::Optimizer;

/// Picks the best heuristic chromosome (seeds plus their pairwise
/// blends) without running the genetic engine.
#[derive(Debug, Clone, Default)]
pub struct HeuristicOptimizer {
    config: OptimizerConfig,
}

impl HeuristicOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }
}

impl Optimizer for HeuristicOptimizer {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn solve(&mut self, system: &System, env: &EnvironmentInput) -> Result<OptSolution> {
        self.config.validate()?;
        env.validate(system)?;
        let op = PlacementOperator::new(system, env, &self.config.objectives)
            .with_chunk_fraction(self.config.chunk_fraction);

        let seeds = heuristic_chromosomes(system, env);
        let candidates: Vec<Vec<f64>> = seeds
            .iter()
            .chain(merged_chromosomes(&seeds).iter())
            .map(Chromosome::flatten)
            .collect();
        let count = candidates.len();
        let decision = best_of(&op, candidates, Ranking::Dominance(self.config.dominance))?;
        info!(optimizer = self.name(), candidates = count, "decision ready");
        finalize(self.name(), system, decision)
    }
}
