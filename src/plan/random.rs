//! Random sampling of index tuples.

use rand::Rng;

use crate::error::{PlacementError, Result};
use crate::random::rng_from;

use super::context::PlanContext;
use super::types::{Plan, PlanFinder};

/// Plan finder evaluating the context's seed tuples plus `samples`
/// uniformly drawn tuples.
#[derive(Debug, Clone, Copy)]
pub struct RandomPlanFinder {
    samples: usize,
    seed: Option<u64>,
}

impl RandomPlanFinder {
    pub fn new(samples: usize) -> Self {
        Self { samples, seed: None }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl PlanFinder for RandomPlanFinder {
    fn solve(&self, ctx: &PlanContext<'_>) -> Result<Vec<Plan>> {
        let pool = ctx.pool_size();
        if pool == 0 {
            return Err(PlacementError::EmptyPopulation);
        }
        if ctx.nb_stages() == 0 {
            return Ok(Vec::new());
        }
        let mut rng = rng_from(self.seed);
        let mut tuples = ctx.seeds().to_vec();
        for _ in 0..self.samples {
            tuples.push((0..ctx.nb_stages()).map(|_| rng.random_range(0..pool)).collect());
        }
        Ok(ctx.rank(ctx.evaluate_all(&tuples)))
    }
}
