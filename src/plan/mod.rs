//! Plan search for the lookahead controller.
//!
//! A plan picks one pooled candidate chromosome per lookahead stage. Its
//! fitness comes from a rollout: stage `k` decodes its candidate against
//! the system left by stage `k - 1`, scores it, and advances the system
//! with a [`SystemEstimator`](crate::optimizer::SystemEstimator). The
//! per-stage scores are reduced by a [`PlanAggregation`].
//!
//! Finders are interchangeable behind [`PlanFinder`]:
//!
//! - [`GaPlanFinder`]: random-key GA over index tuples
//! - [`BeamPlanFinder`]: stage-wise beam search
//! - [`RandomPlanFinder`]: uniform sampling

mod beam;
mod context;
mod decoder;
mod ga;
mod random;
mod types;

pub use beam::BeamPlanFinder;
pub use context::PlanContext;
pub use decoder::PlacementDecoder;
pub use ga::GaPlanFinder;
pub use random::RandomPlanFinder;
pub use types::{ControlDecoder, Plan, PlanAggregation, PlanFinder};
