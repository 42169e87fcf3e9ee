//! Genetic core: biased random-key evolution with scalar or
//! dominance-based ranking.
//!
//! The engine separates population management from the problem: a
//! chromosome is a vector of `f64` keys in `[0, 1]`, and an [`Operator`]
//! maps keys to a decision and an objective vector. The same loop runs
//! single-objective BRKGA (ranking by scalar value) and an NSGA-II-style
//! multi-objective search (ranking by non-dominated fronts and crowding
//! distance under [`DominanceKind`]).
//!
//! # Key Types
//!
//! - [`Operator`]: decode / evaluate / seed / stop contract
//! - [`GeneticConfig`]: population fractions, stall window, worker pool
//! - [`GeneticRunner`]: executes the loop and returns a [`GeneticResult`]
//!
//! # References
//!
//! - Bean (1994), "Genetic algorithms and random keys for sequencing and optimization"
//! - Goncalves & Resende (2011), "Biased random-key genetic algorithms for
//!   combinatorial optimization", *J. Heuristics* 17(5), 487–525
//! - Deb et al. (2002), *A Fast and Elitist Multiobjective GA: NSGA-II*

mod config;
mod dominance;
mod multi_objective;
mod runner;
mod types;

pub use config::GeneticConfig;
pub use dominance::{pareto_dominates, preferred_dominates, sanitize, DominanceKind};
pub use multi_objective::{crowding_distance, non_dominated_sort, rank_order, NondominatedSortResult};
pub use runner::{rank, GeneticResult, GeneticRunner, Ranking, StopReason};
pub use types::{Individual, Operator};
