//! Rollout of index tuples through the system estimator.

use rayon::prelude::*;

use crate::genetic::{rank_order, DominanceKind};
use crate::model::{OptSolution, System};
use crate::optimizer::SystemEstimator;

use super::types::{ControlDecoder, Plan, PlanAggregation};

/// Everything a plan finder needs: the candidate pool, how to decode a
/// candidate at a stage, and how the system moves between stages.
pub struct PlanContext<'a> {
    system: &'a System,
    pool: &'a [Vec<f64>],
    decoder: &'a dyn ControlDecoder,
    estimator: &'a dyn SystemEstimator,
    aggregation: &'a PlanAggregation,
    dominance: DominanceKind,
    seeds: Vec<Vec<usize>>,
}

/// A partially rolled-out plan.
#[derive(Debug, Clone)]
pub(super) struct Rollout {
    pub system: System,
    pub indices: Vec<usize>,
    pub decisions: Vec<OptSolution>,
    pub stage_fitness: Vec<Vec<f64>>,
}

impl<'a> PlanContext<'a> {
    pub fn new(
        system: &'a System,
        pool: &'a [Vec<f64>],
        decoder: &'a dyn ControlDecoder,
        estimator: &'a dyn SystemEstimator,
        aggregation: &'a PlanAggregation,
    ) -> Self {
        Self {
            system,
            pool,
            decoder,
            estimator,
            aggregation,
            dominance: DominanceKind::default(),
            seeds: Vec::new(),
        }
    }

    pub fn with_dominance(mut self, dominance: DominanceKind) -> Self {
        self.dominance = dominance;
        self
    }

    /// Index tuples every finder should consider.
    pub fn with_seeds(mut self, seeds: Vec<Vec<usize>>) -> Self {
        self.seeds = seeds;
        self
    }

    pub fn nb_stages(&self) -> usize {
        self.decoder.nb_stages()
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    pub fn dominance(&self) -> DominanceKind {
        self.dominance
    }

    pub fn seeds(&self) -> &[Vec<usize>] {
        &self.seeds
    }

    pub(super) fn start(&self) -> Rollout {
        Rollout {
            system: self.system.clone(),
            indices: Vec::new(),
            decisions: Vec::new(),
            stage_fitness: Vec::new(),
        }
    }

    /// Applies pool candidate `index` at the rollout's next stage.
    pub(super) fn extend(&self, rollout: &Rollout, index: usize) -> Rollout {
        let stage = rollout.indices.len();
        let keys = self.pool.get(index).map(Vec::as_slice).unwrap_or(&[]);
        let decision = self.decoder.decode(stage, &rollout.system, keys);
        let fitness = self.decoder.evaluate(stage, &rollout.system, &decision);
        let system = self
            .estimator
            .calc(&rollout.system, &decision, self.decoder.environment(stage));

        let mut next = Rollout {
            system,
            indices: rollout.indices.clone(),
            decisions: rollout.decisions.clone(),
            stage_fitness: rollout.stage_fitness.clone(),
        };
        next.indices.push(index);
        next.decisions.push(decision);
        next.stage_fitness.push(fitness);
        next
    }

    /// Aggregated fitness of a (possibly partial) rollout.
    pub(super) fn fitness_of(&self, rollout: &Rollout) -> Vec<f64> {
        self.aggregation.aggregate(&rollout.stage_fitness)
    }

    pub(super) fn finish(&self, rollout: Rollout) -> Plan {
        let fitness = self.fitness_of(&rollout);
        Plan {
            indices: rollout.indices,
            decisions: rollout.decisions,
            stage_fitness: rollout.stage_fitness,
            fitness,
        }
    }

    /// Rolls a full index tuple forward from the current system.
    ///
    /// Stage `k` decodes `pool[indices[k]]` against the system produced
    /// by stage `k - 1`. Extra indices beyond the stage count are ignored.
    pub fn evaluate(&self, indices: &[usize]) -> Plan {
        let rollout = indices
            .iter()
            .take(self.nb_stages())
            .fold(self.start(), |r, &i| self.extend(&r, i));
        self.finish(rollout)
    }

    /// Evaluates independent tuples concurrently. Output order follows
    /// input order.
    pub fn evaluate_all(&self, tuples: &[Vec<usize>]) -> Vec<Plan> {
        tuples.par_iter().map(|t| self.evaluate(t)).collect()
    }

    /// Sorts plans best-first by aggregated fitness: non-dominated
    /// fronts, then crowding distance.
    pub fn rank(&self, plans: Vec<Plan>) -> Vec<Plan> {
        let objectives: Vec<Vec<f64>> = plans.iter().map(|p| p.fitness.clone()).collect();
        let (order, _) = rank_order(&objectives, self.dominance);
        let mut slots: Vec<Option<Plan>> = plans.into_iter().map(Some).collect();
        order.into_iter().filter_map(|i| slots[i].take()).collect()
    }

    /// Picks the plan to act on.
    ///
    /// Plans on the first front of aggregated fitness are finalists. Their
    /// first-stage fitness is ranked together with `incumbents` (objective
    /// vectors of the current stage's own candidates), and the best-ranked
    /// finalist wins. Returns `None` when `plans` is empty.
    pub fn select(&self, plans: Vec<Plan>, incumbents: &[Vec<f64>]) -> Option<Plan> {
        let aggregated: Vec<Vec<f64>> = plans.iter().map(|p| p.fitness.clone()).collect();
        let (order, front) = rank_order(&aggregated, self.dominance);
        let mut slots: Vec<Option<Plan>> = plans.into_iter().map(Some).collect();
        let mut finalists: Vec<Option<Plan>> = order
            .into_iter()
            .take(front)
            .filter_map(|i| slots[i].take())
            .map(Some)
            .collect();

        let mut first_stage = incumbents.to_vec();
        first_stage.extend(finalists.iter().flatten().map(|p| {
            p.stage_fitness
                .first()
                .cloned()
                .unwrap_or_else(|| vec![f64::INFINITY])
        }));
        let (order, _) = rank_order(&first_stage, self.dominance);
        let pick = order.into_iter().find(|&i| i >= incumbents.len())?;
        finalists[pick - incumbents.len()].take()
    }
}
