//! Single-epoch genetic search shared by the optimizers.

use tracing::error;

use crate::error::{PlacementError, Result};
use crate::genetic::{rank, GeneticResult, GeneticRunner, Individual, Operator, Ranking};
use crate::model::{EnvironmentInput, OptSolution, System};
use crate::operator::{validate_solution, PlacementOperator};

use super::config::OptimizerConfig;

/// Final population of the previous solve, reinjected as seeds.
#[derive(Debug, Clone, Default)]
pub(crate) struct WarmStart {
    keys: Vec<Vec<f64>>,
}

impl WarmStart {
    pub fn seeds(&self, enabled: bool) -> Vec<Vec<f64>> {
        if enabled {
            self.keys.clone()
        } else {
            Vec::new()
        }
    }

    pub fn remember(&mut self, result: &GeneticResult, enabled: bool) {
        if enabled {
            self.keys = result.population.iter().map(|i| i.keys().to_vec()).collect();
        }
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

/// Runs the genetic engine on one epoch and decodes the best individual.
///
/// The run's seed is the configured seed plus `seed_offset`, so stages
/// of a lookahead search draw independent streams.
pub(crate) fn run_stage(
    config: &OptimizerConfig,
    ranking: Ranking,
    weights: Option<Vec<f64>>,
    system: &System,
    env: &EnvironmentInput,
    warm: Vec<Vec<f64>>,
    seed_offset: u64,
) -> Result<(OptSolution, GeneticResult)> {
    let mut op = PlacementOperator::new(system, env, &config.objectives)
        .with_chunk_fraction(config.chunk_fraction)
        .with_heuristic_seeds(config.use_heuristic_seeds);
    if let Some(w) = weights {
        op = op.with_weights(w);
    }
    let mut genetic = config.genetic.clone();
    genetic.seed = genetic.seed.map(|s| s.wrapping_add(seed_offset));

    let result = GeneticRunner::run_seeded(&op, &genetic, ranking, warm)?;
    let best = result.best().ok_or(PlacementError::EmptyPopulation)?;
    Ok((op.decode(best.keys()), result))
}

/// Decodes every chromosome and returns the first one under `ranking`.
pub(crate) fn best_of(
    op: &PlacementOperator<'_>,
    chromosomes: Vec<Vec<f64>>,
    ranking: Ranking,
) -> Result<OptSolution> {
    let mut population: Vec<Individual> = chromosomes
        .into_iter()
        .map(|keys| {
            let mut ind = Individual::new(keys);
            let fitness = op.evaluate(ind.keys());
            ind.set_fitness(fitness);
            ind
        })
        .collect();
    rank(&mut population, ranking);
    let best = population.first().ok_or(PlacementError::EmptyPopulation)?;
    Ok(op.decode(best.keys()))
}

/// Validates the decision handed back to the caller.
pub(crate) fn finalize(optimizer: &str, system: &System, decision: OptSolution) -> Result<OptSolution> {
    if let Err(e) = validate_solution(system, &decision) {
        error!(optimizer, error = %e, "decision violates invariants");
        return Err(e);
    }
    Ok(decision)
}
