//! Objective functions over a decision.
//!
//! Every objective is minimized and maps `(System, OptSolution,
//! EnvironmentInput)` to a single `f64`. Objectives are selected at
//! configuration time as a list of [`Objective`] values.

mod delay;

use std::fmt;
use std::sync::Arc;

use crate::model::{EnvironmentInput, OptSolution, System};

pub use delay::{estimate_response_time, processing_delay, response_time};

/// Cap on the per-request deadline overshoot ratio, so a saturated
/// replica contributes a large but finite penalty.
pub const MAX_VIOLATION_RATIO: f64 = 10.0;

type ObjectiveFn = dyn Fn(&System, &OptSolution, &EnvironmentInput) -> f64 + Send + Sync;

/// A named metric evaluator.
#[derive(Clone)]
pub enum Objective {
    /// Load-weighted mean of `max(0, rt - deadline) / deadline`.
    DeadlineViolation,
    /// Sum of node cost estimators applied to allocated amounts.
    OperationalCost,
    /// User-weighted mean probability that no replica of an
    /// application is up.
    Unavailability,
    /// Data moved to create replicas absent from the previous decision,
    /// weighted by network delay from the nearest previous host.
    MigrationCost,
    /// Caller-supplied metric.
    Custom { name: String, f: Arc<ObjectiveFn> },
}

impl Objective {
    pub fn custom(
        name: impl Into<String>,
        f: impl Fn(&System, &OptSolution, &EnvironmentInput) -> f64 + Send + Sync + 'static,
    ) -> Self {
        Objective::Custom {
            name: name.into(),
            f: Arc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Objective::DeadlineViolation => "deadline_violation",
            Objective::OperationalCost => "operational_cost",
            Objective::Unavailability => "unavailability",
            Objective::MigrationCost => "migration_cost",
            Objective::Custom { name, .. } => name,
        }
    }

    pub fn evaluate(&self, system: &System, solution: &OptSolution, env: &EnvironmentInput) -> f64 {
        match self {
            Objective::DeadlineViolation => deadline_violation(system, solution, env),
            Objective::OperationalCost => operational_cost(system, solution),
            Objective::Unavailability => unavailability(system, solution, env),
            Objective::MigrationCost => migration_cost(system, solution, env),
            Objective::Custom { f, .. } => f(system, solution, env),
        }
    }
}

impl fmt::Debug for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Objective({})", self.name())
    }
}

/// Evaluates every objective in order.
pub fn evaluate_objectives(
    objectives: &[Objective],
    system: &System,
    solution: &OptSolution,
    env: &EnvironmentInput,
) -> Vec<f64> {
    objectives
        .iter()
        .map(|o| o.evaluate(system, solution, env))
        .collect()
}

fn deadline_violation(system: &System, solution: &OptSolution, env: &EnvironmentInput) -> f64 {
    let mut weighted = 0.0;
    let mut total = 0.0;
    for (app, spec) in system.apps.iter().enumerate() {
        for src in 0..system.nb_nodes() {
            let load = env.generated_load[app][src];
            if load <= 0.0 {
                continue;
            }
            for dst in 0..system.nb_nodes() {
                let share = load * solution.load_distribution[app][src][dst];
                if share <= 0.0 {
                    continue;
                }
                let rt = response_time(system, solution, env, app, src, dst);
                let ratio = ((rt - spec.deadline) / spec.deadline)
                    .max(0.0)
                    .min(MAX_VIOLATION_RATIO);
                weighted += share * ratio;
                total += share;
            }
        }
    }
    if total > 0.0 {
        weighted / total
    } else {
        0.0
    }
}

fn operational_cost(system: &System, solution: &OptSolution) -> f64 {
    let mut cost = 0.0;
    for app in 0..system.nb_apps() {
        for node in solution.hosts(app) {
            for (r, estimator) in system.nodes[node].cost.iter().enumerate() {
                cost += estimator.eval(solution.allocated[app][node][r]);
            }
        }
    }
    cost
}

fn unavailability(system: &System, solution: &OptSolution, env: &EnvironmentInput) -> f64 {
    let total_users: usize = env.attached_users.iter().sum();
    let mut acc = 0.0;
    for app in 0..system.nb_apps() {
        let weight = if total_users > 0 {
            env.attached_users[app] as f64 / total_users as f64
        } else {
            1.0 / system.nb_apps() as f64
        };
        let all_down: f64 = solution
            .hosts(app)
            .iter()
            .map(|&n| 1.0 - system.nodes[n].availability)
            .product();
        acc += weight * all_down;
    }
    acc
}

fn migration_cost(system: &System, solution: &OptSolution, env: &EnvironmentInput) -> f64 {
    let Some(previous) = system.previous.as_ref() else {
        return 0.0;
    };
    let mut cost = 0.0;
    for (app, spec) in system.apps.iter().enumerate() {
        let before = previous.hosts(app);
        for node in solution.hosts(app) {
            if previous.is_placed(app, node) {
                continue;
            }
            let transfer = before
                .iter()
                .map(|&p| env.delay(app, p, node))
                .fold(f64::INFINITY, f64::min);
            let transfer = if transfer.is_finite() { transfer } else { 1.0 };
            cost += spec.data_size * transfer;
        }
    }
    cost
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{one_app_system, two_node_env};

    fn routed(system: &System, env: &EnvironmentInput, dst: usize) -> OptSolution {
        let mut sol = OptSolution::new(1, system.nb_nodes(), system.nb_resources());
        let load = env.total_load(0);
        sol.placement[0][dst] = true;
        sol.received_load[0][dst] = load;
        for r in 0..system.nb_resources() {
            sol.allocated[0][dst][r] = system.apps[0].demand_of(r, load);
        }
        for src in 0..system.nb_nodes() {
            sol.load_distribution[0][src][dst] = 1.0;
        }
        sol
    }

    #[test]
    fn test_deadline_violation_zero_when_fast() {
        let system = one_app_system();
        let env = two_node_env(&system);
        let sol = routed(&system, &env, 1);
        let v = Objective::DeadlineViolation.evaluate(&system, &sol, &env);
        assert_eq!(v, 0.0);
    }

    #[test]
    fn test_deadline_violation_positive_when_far() {
        let system = one_app_system();
        let env = two_node_env(&system);
        // The cloud is 2 s away from the source: deadline of 0.5 s is missed.
        let sol = routed(&system, &env, system.cloud_index());
        let v = Objective::DeadlineViolation.evaluate(&system, &sol, &env);
        assert!(v > 1.0, "expected violation, got {v}");
        assert!(v <= MAX_VIOLATION_RATIO);
    }

    #[test]
    fn test_operational_cost_counts_only_hosts() {
        let system = one_app_system();
        let env = two_node_env(&system);
        let sol = routed(&system, &env, 1);
        let cost = Objective::OperationalCost.evaluate(&system, &sol, &env);
        // node 1 charges 1.0 per CPU unit; demand = 2 * load(5)
        assert!((cost - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_unavailability_product() {
        let system = one_app_system();
        let env = two_node_env(&system);
        let mut sol = routed(&system, &env, 1);
        let single = Objective::Unavailability.evaluate(&system, &sol, &env);
        sol.placement[0][0] = true;
        let double = Objective::Unavailability.evaluate(&system, &sol, &env);
        assert!(double < single);
    }

    #[test]
    fn test_migration_cost_needs_previous() {
        let system = one_app_system();
        let env = two_node_env(&system);
        let sol = routed(&system, &env, 1);
        assert_eq!(Objective::MigrationCost.evaluate(&system, &sol, &env), 0.0);

        let moved = system.clone().with_previous(routed(&system, &env, 0));
        let cost = Objective::MigrationCost.evaluate(&moved, &sol, &env);
        assert!(cost > 0.0);
        let same = system.clone().with_previous(sol.clone());
        assert_eq!(Objective::MigrationCost.evaluate(&same, &sol, &env), 0.0);
    }

    #[test]
    fn test_custom_objective() {
        let system = one_app_system();
        let env = two_node_env(&system);
        let sol = routed(&system, &env, 1);
        let obj = Objective::custom("instances", |_, s, _| s.nb_instances(0) as f64);
        assert_eq!(obj.name(), "instances");
        let values = evaluate_objectives(&[obj, Objective::MigrationCost], &system, &sol, &env);
        assert_eq!(values, vec![1.0, 0.0]);
    }
}
