//! Collaborators supplied by the simulation harness.
//!
//! The lookahead controller needs a forecast of future environment
//! inputs and a way to advance the system one epoch under a decision.
//! Both are traits so a harness can plug in its own models; the
//! reference implementations here are enough for tests and benches.

use crate::model::{ControlInput, EnvironmentInput, System};

/// Forecasts upcoming environment inputs.
pub trait EnvironmentPredictor: Send + Sync {
    /// Returns up to `window` inputs following `current`, nearest first.
    ///
    /// Returning fewer than `window` inputs signals the end of the
    /// forecast horizon.
    fn predict(&self, system: &System, current: &EnvironmentInput, window: usize) -> Vec<EnvironmentInput>;
}

/// Advances a system one epoch.
pub trait SystemEstimator: Send + Sync {
    /// State of the system after `control` has been applied during an
    /// epoch with environment `env`.
    fn calc(&self, system: &System, control: &ControlInput, env: &EnvironmentInput) -> System;
}

/// Assumes the environment stays as it is now.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersistencePredictor;

impl EnvironmentPredictor for PersistencePredictor {
    fn predict(&self, _system: &System, current: &EnvironmentInput, window: usize) -> Vec<EnvironmentInput> {
        vec![current.clone(); window]
    }
}

/// Replays a recorded sequence of inputs.
///
/// The input for epoch `t` is `inputs[t]`, where `t` is the system time
/// divided by its sampling interval. Near the end of the recording the
/// forecast comes back short.
#[derive(Debug, Clone, Default)]
pub struct SequencePredictor {
    inputs: Vec<EnvironmentInput>,
}

impl SequencePredictor {
    pub fn new(inputs: Vec<EnvironmentInput>) -> Self {
        Self { inputs }
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

impl EnvironmentPredictor for SequencePredictor {
    fn predict(&self, system: &System, _current: &EnvironmentInput, window: usize) -> Vec<EnvironmentInput> {
        let step = if system.sampling_interval > 0.0 {
            (system.time / system.sampling_interval).round().max(0.0) as usize
        } else {
            0
        };
        self.inputs.iter().skip(step + 1).take(window).cloned().collect()
    }
}

/// Moves the clock forward by one sampling interval and records the
/// decision as the system's previous one.
#[derive(Debug, Clone, Copy, Default)]
pub struct CarryOverEstimator;

impl SystemEstimator for CarryOverEstimator {
    fn calc(&self, system: &System, control: &ControlInput, _env: &EnvironmentInput) -> System {
        system
            .clone()
            .with_time(system.time + system.sampling_interval)
            .with_previous(control.clone())
    }
}
