//! Stage decoder backed by the placement operator.

use crate::genetic::Operator;
use crate::metrics::{evaluate_objectives, Objective};
use crate::model::{EnvironmentInput, OptSolution, System};
use crate::operator::{is_solution_valid, PlacementOperator, DEFAULT_CHUNK_FRACTION};

use super::types::ControlDecoder;

/// Decodes pooled chromosomes with a [`PlacementOperator`] bound to
/// each stage's environment input.
#[derive(Debug, Clone)]
pub struct PlacementDecoder {
    stages: Vec<EnvironmentInput>,
    objectives: Vec<Objective>,
    chunk_fraction: f64,
}

impl PlacementDecoder {
    /// `stages[0]` is the current input, the rest are forecasts.
    pub fn new(stages: Vec<EnvironmentInput>, objectives: Vec<Objective>) -> Self {
        Self {
            stages,
            objectives,
            chunk_fraction: DEFAULT_CHUNK_FRACTION,
        }
    }

    pub fn with_chunk_fraction(mut self, fraction: f64) -> Self {
        self.chunk_fraction = fraction;
        self
    }

    fn operator<'a>(&'a self, stage: usize, system: &'a System) -> PlacementOperator<'a> {
        PlacementOperator::new(system, &self.stages[stage], &self.objectives)
            .with_chunk_fraction(self.chunk_fraction)
            .with_heuristic_seeds(false)
    }
}

impl ControlDecoder for PlacementDecoder {
    fn nb_stages(&self) -> usize {
        self.stages.len()
    }

    fn environment(&self, stage: usize) -> &EnvironmentInput {
        &self.stages[stage]
    }

    fn decode(&self, stage: usize, system: &System, keys: &[f64]) -> OptSolution {
        self.operator(stage, system).decode(keys)
    }

    fn evaluate(&self, stage: usize, system: &System, solution: &OptSolution) -> Vec<f64> {
        if !is_solution_valid(system, solution) {
            return vec![f64::INFINITY; self.objectives.len().max(1)];
        }
        evaluate_objectives(&self.objectives, system, solution, &self.stages[stage])
    }
}
