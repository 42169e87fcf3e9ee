//! Per-epoch environment snapshot.

use crate::error::{PlacementError, Result};

use super::system::System;

/// Exogenous inputs for one control epoch.
///
/// All matrices are indexed by application first, then node(s).
/// Instances are immutable once handed to an optimizer; the lookahead
/// controller holds the current one plus a predicted sequence.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvironmentInput {
    /// `[app][node]` requests per second generated at the node.
    pub generated_load: Vec<Vec<f64>>,
    /// `[app][node]` requests waiting at the node.
    pub queue_size: Vec<Vec<f64>>,
    /// `[app][src][dst]` network delay in seconds.
    pub net_delay: Vec<Vec<Vec<f64>>>,
    /// `[app][src][dst]` routed path as node indices. May be left empty.
    pub net_path: Vec<Vec<Vec<Vec<usize>>>>,
    /// `[app]` number of users attached to the application.
    pub attached_users: Vec<usize>,
}

impl EnvironmentInput {
    /// Creates an all-zero input for the given dimensions.
    pub fn new(nb_apps: usize, nb_nodes: usize) -> Self {
        Self {
            generated_load: vec![vec![0.0; nb_nodes]; nb_apps],
            queue_size: vec![vec![0.0; nb_nodes]; nb_apps],
            net_delay: vec![vec![vec![0.0; nb_nodes]; nb_nodes]; nb_apps],
            net_path: Vec::new(),
            attached_users: vec![0; nb_apps],
        }
    }

    /// Creates an all-zero input sized for `system`.
    pub fn for_system(system: &System) -> Self {
        Self::new(system.nb_apps(), system.nb_nodes())
    }

    pub fn with_load(mut self, app: usize, node: usize, load: f64) -> Self {
        self.generated_load[app][node] = load;
        self
    }

    pub fn with_queue(mut self, app: usize, node: usize, queued: f64) -> Self {
        self.queue_size[app][node] = queued;
        self
    }

    /// Sets a symmetric delay between two nodes for one application.
    pub fn with_delay(mut self, app: usize, a: usize, b: usize, delay: f64) -> Self {
        self.net_delay[app][a][b] = delay;
        self.net_delay[app][b][a] = delay;
        self
    }

    /// Sets the same delay matrix for every application.
    pub fn with_delay_matrix(mut self, matrix: &[Vec<f64>]) -> Self {
        for app_delays in &mut self.net_delay {
            for (row, src) in app_delays.iter_mut().zip(matrix) {
                row.clone_from(src);
            }
        }
        self
    }

    pub fn with_users(mut self, app: usize, users: usize) -> Self {
        self.attached_users[app] = users;
        self
    }

    pub fn nb_apps(&self) -> usize {
        self.generated_load.len()
    }

    pub fn nb_nodes(&self) -> usize {
        self.generated_load.first().map_or(0, Vec::len)
    }

    /// Total load generated for an application across all sources.
    pub fn total_load(&self, app: usize) -> f64 {
        self.generated_load[app].iter().sum()
    }

    /// Sources with a positive generated load for an application.
    pub fn demand_sources(&self, app: usize) -> Vec<usize> {
        self.generated_load[app]
            .iter()
            .enumerate()
            .filter(|(_, &l)| l > 0.0)
            .map(|(n, _)| n)
            .collect()
    }

    pub fn delay(&self, app: usize, src: usize, dst: usize) -> f64 {
        self.net_delay[app][src][dst]
    }

    /// Routed path from `src` to `dst`, empty when unknown.
    pub fn path(&self, app: usize, src: usize, dst: usize) -> &[usize] {
        self.net_path
            .get(app)
            .and_then(|p| p.get(src))
            .and_then(|p| p.get(dst))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Checks that every matrix matches the system's dimensions.
    pub fn validate(&self, system: &System) -> Result<()> {
        let (apps, nodes) = (system.nb_apps(), system.nb_nodes());
        let square = |m: &Vec<Vec<f64>>| m.len() == nodes && m.iter().all(|r| r.len() == nodes);
        let ok = self.generated_load.len() == apps
            && self.generated_load.iter().all(|r| r.len() == nodes)
            && self.queue_size.len() == apps
            && self.queue_size.iter().all(|r| r.len() == nodes)
            && self.net_delay.len() == apps
            && self.net_delay.iter().all(square)
            && self.attached_users.len() == apps;
        if !ok {
            return Err(PlacementError::InvalidModel(format!(
                "environment input does not match {apps} applications x {nodes} nodes"
            )));
        }
        if self
            .generated_load
            .iter()
            .flatten()
            .any(|l| !l.is_finite() || *l < 0.0)
        {
            return Err(PlacementError::InvalidModel(
                "generated load must be finite and non-negative".into(),
            ));
        }
        Ok(())
    }
}
