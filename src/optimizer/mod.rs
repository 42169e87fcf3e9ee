//! Placement optimizers.
//!
//! Every optimizer maps the current [`System`] and [`EnvironmentInput`]
//! to one control decision through the [`Optimizer`] trait:
//!
//! - [`CloudOptimizer`]: everything on the cloud node.
//! - [`HeuristicOptimizer`]: best of the heuristic seeds, no search.
//! - [`SogaOptimizer`]: genetic search on a weighted objective sum.
//! - [`MogaOptimizer`]: genetic search with non-dominated ranking.
//! - [`LlcOptimizer`]: per-stage searches over a forecast window followed
//!   by a search over decision sequences.
//!
//! Returned decisions always pass [`validate_solution`](crate::operator::validate_solution).

mod cloud;
mod config;
mod external;
mod heuristic;
mod llc;
mod moga;
mod search;
mod soga;

pub use cloud::CloudOptimizer;
pub use config::{LlcConfig, OptimizerConfig, PlanFinderKind, PredictionShortfall};
pub use external::{CarryOverEstimator, EnvironmentPredictor, PersistencePredictor, SequencePredictor, SystemEstimator};
pub use heuristic::HeuristicOptimizer;
pub use llc::{LlcOptimizer, LlcState};
pub use moga::MogaOptimizer;
pub use soga::SogaOptimizer;

use crate::error::Result;
use crate::model::{EnvironmentInput, OptSolution, System};

/// Solves one control epoch.
pub trait Optimizer {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Computes the decision for the current epoch.
    ///
    /// Fails on an invalid configuration, an environment that does not
    /// match `system`, or a decision that violates the solution
    /// invariants after repair.
    fn solve(&mut self, system: &System, env: &EnvironmentInput) -> Result<OptSolution>;

    /// Forgets state carried between epochs (e.g. warm-start populations).
    fn reset(&mut self) {}
}
