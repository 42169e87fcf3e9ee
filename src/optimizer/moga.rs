//! Multi-objective genetic optimizer.

use tracing::info;

use crate::error::Result;
use crate::genetic::{GeneticResult, Ranking};
use crate::model::{EnvironmentInput, OptSolution, System};

use super::config::OptimizerConfig;
use super::search::{finalize, run_stage, WarmStart};
use super::Optimizer;

/// NSGA-II-style search ranking by non-dominated fronts under the
/// configured dominance. Returns the first-ranked decision.
#[derive(Debug, Clone, Default)]
pub struct MogaOptimizer {
    config: OptimizerConfig,
    warm: WarmStart,
    last: Option<GeneticResult>,
}

impl MogaOptimizer {
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

impl Optimizer for MogaOptimizer {
    fn name(&self) -> &'static str {
        "moga"
    }

    fn solve(&mut self, system: &System, env: &EnvironmentInput) -> Result<OptSolution> {
        self.config.validate()?;
        env.validate(system)?;
        let (decision, result) = run_stage(
            &self.config,
            Ranking::Dominance(self.config.dominance),
            None,
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
            front = result.front_size,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetic::{DominanceKind, GeneticConfig};
    use crate::operator::is_solution_valid;
    use crate::testing::{scaled_env, small_fleet};

    fn config() -> OptimizerConfig {
        OptimizerConfig::default().with_genetic(
            GeneticConfig::default()
                .with_population_size(16)
                .with_max_generations(6)
                .with_parallel(false)
                .with_seed(5),
        )
    }

    #[test]
    fn test_front_is_mutually_non_dominated() {
        let system = small_fleet();
        let env = scaled_env(&system, 1.5);
        let mut moga = MogaOptimizer::new(config().with_dominance(DominanceKind::Pareto));
        let decision = moga.solve(&system, &env).unwrap();
        assert!(is_solution_valid(&system, &decision));

        let result = moga.last_result().unwrap();
        let front: Vec<Vec<f64>> = result.front().iter().map(|i| i.objectives()).collect();
        assert!(!front.is_empty());
        for a in &front {
            for b in &front {
                assert!(!DominanceKind::Pareto.dominates(a, b));
            }
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let system = small_fleet();
        let env = scaled_env(&system, 1.0);
        let seq = MogaOptimizer::new(config()).solve(&system, &env).unwrap();
        let mut par_config = config();
        par_config.genetic = par_config.genetic.with_parallel(true).with_pool_size(3);
        let par = MogaOptimizer::new(par_config).solve(&system, &env).unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn test_reset_clears_warm_start() {
        let system = small_fleet();
        let env = scaled_env(&system, 1.0);
        let mut moga = MogaOptimizer::new(config());
        let first = moga.solve(&system, &env).unwrap();
        moga.reset();
        assert!(moga.last_result().is_none());
        // Without a warm start the second run replays the first.
        assert_eq!(moga.solve(&system, &env).unwrap(), first);
    }
}
