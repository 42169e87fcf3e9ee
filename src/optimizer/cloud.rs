//! Cloud-only baseline.

use tracing::info;

use crate::error::Result;
use crate::genetic::Operator;
use crate::model::{EnvironmentInput, OptSolution, System};
use crate::operator::{cloud_chromosome, PlacementOperator};

use super::search::finalize;
use super::Optimizer;

/// Serves every application from the cloud node.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloudOptimizer;

impl Optimizer for CloudOptimizer {
    fn name(&self) -> &'static str {
        "cloud"
    }

    fn solve(&mut self, system: &System, env: &EnvironmentInput) -> Result<OptSolution> {
        env.validate(system)?;
        let op = PlacementOperator::new(system, env, &[]).with_heuristic_seeds(false);
        let decision = op.decode(&cloud_chromosome(system).flatten());
        info!(optimizer = self.name(), "decision ready");
        finalize(self.name(), system, decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{small_fleet, small_fleet_env};

    #[test]
    fn test_everything_on_cloud() {
        let system = small_fleet();
        let env = small_fleet_env(&system);
        let decision = CloudOptimizer.solve(&system, &env).unwrap();
        let cloud = system.cloud_index();
        for app in 0..system.nb_apps() {
            assert_eq!(decision.hosts(app), vec![cloud]);
            assert!((decision.received_load[app][cloud] - env.total_load(app)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_mismatched_environment() {
        let system = small_fleet();
        let env = EnvironmentInput::new(1, 2);
        assert!(CloudOptimizer.solve(&system, &env).is_err());
    }
}
