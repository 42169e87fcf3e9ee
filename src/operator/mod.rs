//! Placement operator: chromosome encoding, greedy decode, repair, and
//! heuristic seeds.
//!
//! # Key Types
//!
//! - [`ChromosomeLayout`] / [`Chromosome`]: typed view of the flat keys
//! - [`PlacementOperator`]: [`Operator`](crate::genetic::Operator)
//!   implementation decoding keys into an [`OptSolution`](crate::model::OptSolution)
//! - [`make_solution_feasible`] / [`is_solution_valid`]: repair and
//!   invariant checks
//!
//! # Chromosome
//!
//! For `A` applications on `N` nodes the chromosome holds `A` instance
//! fractions, `A * N` placement priorities and `A * N` dispatch
//! priorities. Decoding is deterministic: equal keys always give the
//! same decision.

mod decode;
mod encoding;
mod heuristics;
mod repair;

pub use decode::{PlacementOperator, DEFAULT_CHUNK_FRACTION};
pub use encoding::{Chromosome, ChromosomeLayout};
pub use heuristics::{
    cloud_chromosome, cluster_medoids_chromosome, deadline_chromosome, heuristic_chromosomes,
    merged_chromosomes, net_delay_chromosome,
};
pub use repair::{is_solution_valid, make_solution_feasible, validate_solution};
