//! Genetic search over index tuples.

use std::collections::HashSet;

use rand::Rng;

use crate::error::{PlacementError, Result};
use crate::genetic::{GeneticConfig, GeneticRunner, Individual, Operator, Ranking};

use super::context::PlanContext;
use super::types::{Plan, PlanFinder};

/// Plan finder reusing the genetic engine.
///
/// A chromosome holds one key per stage; key `k` selects pool entry
/// `floor(k * pool_size)`. The context's seed tuples enter the first
/// population. The final population is returned as ranked plans.
#[derive(Debug, Clone)]
pub struct GaPlanFinder {
    config: GeneticConfig,
}

impl GaPlanFinder {
    pub fn new(config: GeneticConfig) -> Self {
        Self { config }
    }
}

struct PlanOperator<'c, 'a> {
    ctx: &'c PlanContext<'a>,
}

impl PlanOperator<'_, '_> {
    fn index_of(&self, key: f64) -> usize {
        let n = self.ctx.pool_size();
        ((key * n as f64) as usize).min(n.saturating_sub(1))
    }

    fn key_of(&self, index: usize) -> f64 {
        (index as f64 + 0.5) / self.ctx.pool_size() as f64
    }
}

impl Operator for PlanOperator<'_, '_> {
    type Decision = Vec<usize>;

    fn chromosome_length(&self) -> usize {
        self.ctx.nb_stages()
    }

    fn decode(&self, keys: &[f64]) -> Vec<usize> {
        keys.iter().map(|&k| self.index_of(k)).collect()
    }

    fn evaluate(&self, keys: &[f64]) -> Vec<f64> {
        self.ctx.evaluate(&self.decode(keys)).fitness
    }

    fn seed_population<R: Rng>(&self, _rng: &mut R) -> Vec<Vec<f64>> {
        self.ctx
            .seeds()
            .iter()
            .map(|tuple| tuple.iter().map(|&i| self.key_of(i)).collect())
            .collect()
    }
}

impl PlanFinder for GaPlanFinder {
    fn solve(&self, ctx: &PlanContext<'_>) -> Result<Vec<Plan>> {
        if ctx.pool_size() == 0 {
            return Err(PlacementError::EmptyPopulation);
        }
        if ctx.nb_stages() == 0 {
            return Ok(Vec::new());
        }
        let op = PlanOperator { ctx };
        let result = GeneticRunner::run(&op, &self.config, Ranking::Dominance(ctx.dominance()))?;

        let mut seen = HashSet::new();
        let tuples: Vec<Vec<usize>> = result
            .population
            .iter()
            .map(Individual::keys)
            .map(|keys| op.decode(keys))
            .filter(|t| seen.insert(t.clone()))
            .collect();
        Ok(ctx.rank(ctx.evaluate_all(&tuples)))
    }
}
