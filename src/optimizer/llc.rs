//! Multi-stage lookahead controller.
//!
//! One genetic search runs per stage (the current epoch plus each
//! predicted one), all of them concurrently. Their final populations are
//! pooled, and a plan finder then searches tuples of pool indices, one
//! per stage, by rolling each tuple forward through a
//! [`SystemEstimator`]. Among the plans on the first aggregated front,
//! the one whose first stage ranks best against the current stage's own
//! population is chosen, and only that first-stage decision is returned;
//! later stages exist to judge how that decision ages.
//!
//! With a prediction window of zero (or a short forecast under
//! [`PredictionShortfall::Disable`]) the controller is exactly the
//! multi-objective optimizer.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{PlacementError, Result};
use crate::genetic::{GeneticResult, Individual, Ranking};
use crate::model::{EnvironmentInput, OptSolution, System};
use crate::operator::{heuristic_chromosomes, merged_chromosomes};
use crate::plan::{
    BeamPlanFinder, GaPlanFinder, PlacementDecoder, Plan, PlanContext, PlanFinder, RandomPlanFinder,
};

use super::config::{LlcConfig, PlanFinderKind, PredictionShortfall};
use super::external::{EnvironmentPredictor, SystemEstimator};
use super::search::{finalize, run_stage, WarmStart};
use super::Optimizer;

/// Where the controller is in its current (or last) solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlcState {
    #[default]
    Idle,
    StageSearch,
    PlanSearch,
    Done,
}

/// Lookahead controller generic over its forecast and dynamics models.
#[derive(Debug, Clone)]
pub struct LlcOptimizer<P, E> {
    config: LlcConfig,
    predictor: P,
    estimator: E,
    state: LlcState,
    warm: Vec<WarmStart>,
    last_plan: Option<Plan>,
}

impl<P: EnvironmentPredictor, E: SystemEstimator> LlcOptimizer<P, E> {
    pub fn new(config: LlcConfig, predictor: P, estimator: E) -> Self {
        Self {
            config,
            predictor,
            estimator,
            state: LlcState::Idle,
            warm: Vec::new(),
            last_plan: None,
        }
    }

    pub fn config(&self) -> &LlcConfig {
        &self.config
    }

    pub fn state(&self) -> LlcState {
        self.state
    }

    /// Plan chosen by the last solve. `None` when that solve ran without
    /// lookahead.
    pub fn last_plan(&self) -> Option<&Plan> {
        self.last_plan.as_ref()
    }

    /// Current input followed by the usable part of the forecast.
    fn forecast(&self, system: &System, env: &EnvironmentInput) -> Vec<EnvironmentInput> {
        let window = self.config.prediction_window;
        let mut stages = vec![env.clone()];
        if window == 0 {
            return stages;
        }

        let predicted: Vec<EnvironmentInput> = self
            .predictor
            .predict(system, env, window)
            .into_iter()
            .take(window)
            .take_while(|e| e.validate(system).is_ok())
            .collect();
        if predicted.len() < window {
            match self.config.shortfall {
                PredictionShortfall::Disable => {
                    warn!(window, predicted = predicted.len(), "forecast too short, lookahead disabled");
                    return stages;
                }
                PredictionShortfall::Truncate => {
                    warn!(window, predicted = predicted.len(), "forecast too short, lookahead truncated");
                }
            }
        }
        stages.extend(predicted);
        stages
    }

    fn plan_finder(&self, nb_stages: usize) -> Box<dyn PlanFinder> {
        let seed = self.config.base.genetic.seed.map(|s| s.wrapping_add(nb_stages as u64));
        match self.config.plan_finder {
            PlanFinderKind::Genetic => {
                let mut genetic = self.config.base.genetic.clone();
                genetic.seed = seed;
                Box::new(GaPlanFinder::new(genetic))
            }
            PlanFinderKind::Beam { width } => Box::new(BeamPlanFinder::new(width)),
            PlanFinderKind::Random { samples } => {
                let finder = RandomPlanFinder::new(samples);
                Box::new(match seed {
                    Some(s) => finder.with_seed(s),
                    None => finder,
                })
            }
        }
    }

    fn search_stages(
        &mut self,
        system: &System,
        stages: &[EnvironmentInput],
    ) -> Result<Vec<(OptSolution, GeneticResult)>> {
        let base = &self.config.base;
        if self.warm.len() < stages.len() {
            self.warm.resize_with(stages.len(), WarmStart::default);
        }
        let warm = &self.warm;
        let ranking = Ranking::Dominance(base.dominance);

        let runs = stages
            .par_iter()
            .enumerate()
            .map(|(k, env)| run_stage(base, ranking, None, system, env, warm[k].seeds(base.warm_start), k as u64))
            .collect::<Result<Vec<_>>>()?;

        for (k, (_, result)) in runs.iter().enumerate() {
            self.warm[k].remember(result, base.warm_start);
            debug!(
                stage = k,
                generations = result.generations,
                timed_out = result.timed_out(),
                front = result.front_size,
                carried = self.warm[k].len(),
                "stage search finished"
            );
        }
        Ok(runs)
    }

    fn search_plans(
        &self,
        system: &System,
        env: &EnvironmentInput,
        stages: Vec<EnvironmentInput>,
        runs: &[(OptSolution, GeneticResult)],
    ) -> Result<Plan> {
        let base = &self.config.base;
        let nb_stages = stages.len();

        let mut pool: Vec<Vec<f64>> = Vec::new();
        let mut offsets = Vec::with_capacity(nb_stages);
        for (_, result) in runs {
            offsets.push(pool.len());
            pool.extend(result.population.iter().map(|i| i.keys().to_vec()));
        }
        if pool.is_empty() {
            return Err(PlacementError::EmptyPopulation);
        }

        // Each stage's best, and the current best held for the whole window.
        let mut seeds = vec![offsets.clone(), vec![offsets[0]; nb_stages]];
        if self.config.merge_heuristics {
            let heuristics = heuristic_chromosomes(system, env);
            for chromosome in merged_chromosomes(&heuristics) {
                seeds.push(vec![pool.len(); nb_stages]);
                pool.push(chromosome.flatten());
            }
        }

        let decoder =
            PlacementDecoder::new(stages, base.objectives.clone()).with_chunk_fraction(base.chunk_fraction);
        let ctx = PlanContext::new(system, &pool, &decoder, &self.estimator, &self.config.aggregation)
            .with_dominance(base.dominance)
            .with_seeds(seeds);

        let mut plans = self.plan_finder(nb_stages).solve(&ctx)?;
        plans.extend(ctx.evaluate_all(ctx.seeds()));
        debug!(pool = pool.len(), plans = plans.len(), "plan search finished");

        // The stage-0 population competes with the plans' first stages.
        let incumbents: Vec<Vec<f64>> = runs[0].1.population.iter().map(Individual::objectives).collect();
        ctx.select(plans, &incumbents).ok_or(PlacementError::EmptyPopulation)
    }

    fn run(&mut self, system: &System, env: &EnvironmentInput) -> Result<OptSolution> {
        self.state = LlcState::StageSearch;
        let stages = self.forecast(system, env);
        let mut runs = self.search_stages(system, &stages)?;

        if stages.len() == 1 {
            let (decision, _) = runs.swap_remove(0);
            self.state = LlcState::Done;
            self.last_plan = None;
            info!(optimizer = self.name(), stages = 1, "decision ready");
            return finalize(self.name(), system, decision);
        }

        self.state = LlcState::PlanSearch;
        let nb_stages = stages.len();
        let plan = self.search_plans(system, env, stages, &runs)?;
        let decision = plan.first_decision().cloned().ok_or(PlacementError::EmptyPopulation)?;
        info!(
            optimizer = self.name(),
            stages = nb_stages,
            indices = ?plan.indices,
            fitness = ?plan.fitness,
            "decision ready"
        );
        self.state = LlcState::Done;
        self.last_plan = Some(plan);
        finalize(self.name(), system, decision)
    }
}

impl<P: EnvironmentPredictor, E: SystemEstimator> Optimizer for LlcOptimizer<P, E> {
    fn name(&self) -> &'static str {
        "llc"
    }

    fn solve(&mut self, system: &System, env: &EnvironmentInput) -> Result<OptSolution> {
        self.config.validate()?;
        env.validate(system)?;

        let result = self.run(system, env);
        if result.is_err() {
            self.state = LlcState::Idle;
            self.last_plan = None;
        }
        result
    }

    fn reset(&mut self) {
        self.warm.clear();
        self.last_plan = None;
        self.state = LlcState::Idle;
    }
}
