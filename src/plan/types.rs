//! Plan representation and search contracts.

use std::fmt;
use std::sync::Arc;

use crate::error::{PlacementError, Result};
use crate::genetic::sanitize;
use crate::model::{EnvironmentInput, OptSolution, System};

use super::context::PlanContext;

/// One candidate decision per lookahead stage, with its rollout fitness.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Pool index chosen at each stage.
    pub indices: Vec<usize>,
    /// Decision applied at each stage during the rollout.
    pub decisions: Vec<OptSolution>,
    /// Objective vector observed at each stage.
    pub stage_fitness: Vec<Vec<f64>>,
    /// Aggregated objective vector.
    pub fitness: Vec<f64>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The decision to apply now.
    pub fn first_decision(&self) -> Option<&OptSolution> {
        self.decisions.first()
    }
}

/// Turns a pooled chromosome into a decision for a given stage.
///
/// Implementations bind each stage to its (current or predicted)
/// environment input. Decoding must not mutate shared state: plans are
/// evaluated concurrently.
pub trait ControlDecoder: Send + Sync {
    /// Number of stages the decoder knows an environment for.
    fn nb_stages(&self) -> usize;

    /// Environment input of a stage.
    fn environment(&self, stage: usize) -> &EnvironmentInput;

    /// Decodes `keys` into a feasible decision for `system` at `stage`.
    fn decode(&self, stage: usize, system: &System, keys: &[f64]) -> OptSolution;

    /// Objective vector of a decision at `stage`.
    fn evaluate(&self, stage: usize, system: &System, solution: &OptSolution) -> Vec<f64>;
}

/// Searches index tuples for good plans.
pub trait PlanFinder {
    /// Returns evaluated plans, best first.
    fn solve(&self, ctx: &PlanContext<'_>) -> Result<Vec<Plan>>;
}

type AggregateFn = dyn Fn(&[Vec<f64>]) -> Vec<f64> + Send + Sync;

/// Reduction of per-stage objective vectors into one plan fitness.
#[derive(Clone, Default)]
pub enum PlanAggregation {
    /// Component-wise sum over stages.
    #[default]
    Sum,
    /// Component-wise sum with stage `k` weighted by `gamma^k`.
    Discounted(f64),
    /// Caller-supplied reducer.
    Custom(Arc<AggregateFn>),
}

impl PlanAggregation {
    pub fn custom(f: impl Fn(&[Vec<f64>]) -> Vec<f64> + Send + Sync + 'static) -> Self {
        PlanAggregation::Custom(Arc::new(f))
    }

    /// Aggregates per-stage fitness. `NaN` components count as `+∞`.
    pub fn aggregate(&self, stages: &[Vec<f64>]) -> Vec<f64> {
        let discounted = |gamma: f64| {
            let width = stages.iter().map(Vec::len).max().unwrap_or(0);
            let mut total = vec![0.0; width];
            let mut weight = 1.0;
            for stage in stages {
                for (t, v) in total.iter_mut().zip(stage) {
                    *t += weight * sanitize(*v);
                }
                weight *= gamma;
            }
            total
        };
        match self {
            PlanAggregation::Sum => discounted(1.0),
            PlanAggregation::Discounted(gamma) => discounted(*gamma),
            PlanAggregation::Custom(f) => f(stages),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            PlanAggregation::Discounted(gamma) if !(gamma > 0.0 && gamma <= 1.0) => Err(
                PlacementError::InvalidConfig(format!("discount must be in (0, 1], got {gamma}")),
            ),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for PlanAggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanAggregation::Sum => write!(f, "Sum"),
            PlanAggregation::Discounted(gamma) => write!(f, "Discounted({gamma})"),
            PlanAggregation::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}
