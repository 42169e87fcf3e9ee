//! Stage-by-stage beam search.

use rayon::prelude::*;

use crate::error::{PlacementError, Result};
use crate::genetic::rank_order;

use super::context::{PlanContext, Rollout};
use super::types::{Plan, PlanFinder};

/// Plan finder extending the best `width` partial rollouts by every
/// pool entry, one stage at a time.
///
/// Partial plans are ranked on the aggregated fitness of the stages
/// rolled out so far. With `width >= pool_size^(stages - 1)` the search
/// is exhaustive.
#[derive(Debug, Clone, Copy)]
pub struct BeamPlanFinder {
    width: usize,
}

impl BeamPlanFinder {
    pub fn new(width: usize) -> Self {
        Self { width: width.max(1) }
    }
}

impl PlanFinder for BeamPlanFinder {
    fn solve(&self, ctx: &PlanContext<'_>) -> Result<Vec<Plan>> {
        let pool = ctx.pool_size();
        if pool == 0 {
            return Err(PlacementError::EmptyPopulation);
        }
        if ctx.nb_stages() == 0 {
            return Ok(Vec::new());
        }

        let mut beam: Vec<Rollout> = vec![ctx.start()];
        for _ in 0..ctx.nb_stages() {
            let expanded: Vec<Rollout> = beam
                .par_iter()
                .flat_map_iter(|r| (0..pool).map(move |i| ctx.extend(r, i)))
                .collect();
            let fitness: Vec<Vec<f64>> = expanded.iter().map(|r| ctx.fitness_of(r)).collect();
            let (order, _) = rank_order(&fitness, ctx.dominance());
            let mut slots: Vec<Option<Rollout>> = expanded.into_iter().map(Some).collect();
            beam = order
                .into_iter()
                .take(self.width)
                .filter_map(|i| slots[i].take())
                .collect();
        }

        let plans = beam.into_iter().map(|r| ctx.finish(r)).collect();
        Ok(ctx.rank(plans))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{plan_pool, PlanFixture};

    #[test]
    fn test_width_bounds_output() {
        let fx = PlanFixture::new(2);
        let pool = plan_pool(&fx);
        let ctx = fx.context(&pool);
        let plans = BeamPlanFinder::new(3).solve(&ctx).unwrap();
        assert_eq!(plans.len(), 3);
        assert!(plans.iter().all(|p| p.len() == 2));
    }

    #[test]
    fn test_wide_beam_is_exhaustive() {
        let fx = PlanFixture::new(2);
        let pool = plan_pool(&fx);
        let n = pool.len();
        let ctx = fx.context(&pool);

        let plans = BeamPlanFinder::new(n * n).solve(&ctx).unwrap();
        assert_eq!(plans.len(), n * n);

        let all: Vec<Vec<usize>> = (0..n).flat_map(|a| (0..n).map(move |b| vec![a, b])).collect();
        let brute = ctx.evaluate_all(&all);
        let best = &plans[0].fitness;
        assert!(brute.iter().all(|p| !ctx.dominance().dominates(&p.fitness, best)));
    }

    #[test]
    fn test_zero_width_clamped() {
        let fx = PlanFixture::new(1);
        let pool = plan_pool(&fx);
        let ctx = fx.context(&pool);
        assert_eq!(BeamPlanFinder::new(0).solve(&ctx).unwrap().len(), 1);
    }
}
