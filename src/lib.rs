//! Predictive placement and resource allocation for edge/cloud fleets.
//!
//! Each control epoch, an optimizer decides for every application which
//! nodes host a replica, how much of each resource those replicas get,
//! and how request load from every source node is split among them.
//!
//! - **Genetic core** ([`genetic`]): biased random-key evolution with
//!   scalar or NSGA-II-style dominance ranking, Pareto or preferred
//!   dominance.
//! - **Placement operator** ([`operator`]): greedy chunked decode of a
//!   chromosome into a feasible decision, repair, and heuristic seeds
//!   built from network delays, deadlines and K-medoids clusters
//!   ([`kmedoids`]).
//! - **Optimizers** ([`optimizer`]): cloud, heuristic, single- and
//!   multi-objective GA, and a multi-stage lookahead controller that
//!   searches decision sequences over a forecast window ([`plan`]).
//!
//! # Architecture
//!
//! The crate only computes decisions. Simulation, forecasting and state
//! transitions belong to the caller and plug in through
//! [`EnvironmentPredictor`](optimizer::EnvironmentPredictor) and
//! [`SystemEstimator`](optimizer::SystemEstimator).

pub mod error;
pub mod genetic;
pub mod kmedoids;
pub mod metrics;
pub mod model;
pub mod operator;
pub mod optimizer;
pub mod plan;
pub mod random;

#[cfg(test)]
mod testing;

pub use error::{PlacementError, Result};
pub use model::{ControlInput, EnvironmentInput, OptSolution, System};
pub use optimizer::Optimizer;
