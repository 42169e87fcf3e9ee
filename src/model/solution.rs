//! Placement, allocation and routing decision.

/// Tolerance used when checking dispatch completeness and capacity.
pub const EPSILON: f64 = 1e-6;

/// A complete control decision for one epoch.
///
/// Built empty by the placement operator's decode step, mutated only by
/// decode and repair, and treated as frozen once an optimizer returns
/// it. Indexing follows [`EnvironmentInput`](super::EnvironmentInput):
/// application first, then node(s).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptSolution {
    /// `[app][node]` whether a replica runs on the node.
    pub placement: Vec<Vec<bool>>,
    /// `[app][node][resource]` allocated amount.
    pub allocated: Vec<Vec<Vec<f64>>>,
    /// `[app][node]` load routed to the replica.
    pub received_load: Vec<Vec<f64>>,
    /// `[app][src][dst]` fraction of the source's load sent to `dst`.
    pub load_distribution: Vec<Vec<Vec<f64>>>,
}

/// The decision handed to the simulation harness.
pub type ControlInput = OptSolution;

impl OptSolution {
    /// Creates an empty decision: nothing placed, nothing routed.
    pub fn new(nb_apps: usize, nb_nodes: usize, nb_resources: usize) -> Self {
        Self {
            placement: vec![vec![false; nb_nodes]; nb_apps],
            allocated: vec![vec![vec![0.0; nb_resources]; nb_nodes]; nb_apps],
            received_load: vec![vec![0.0; nb_nodes]; nb_apps],
            load_distribution: vec![vec![vec![0.0; nb_nodes]; nb_nodes]; nb_apps],
        }
    }

    pub fn nb_apps(&self) -> usize {
        self.placement.len()
    }

    pub fn nb_nodes(&self) -> usize {
        self.placement.first().map_or(0, Vec::len)
    }

    pub fn is_placed(&self, app: usize, node: usize) -> bool {
        self.placement[app][node]
    }

    /// Nodes hosting a replica of `app`.
    pub fn hosts(&self, app: usize) -> Vec<usize> {
        self.placement[app]
            .iter()
            .enumerate()
            .filter(|(_, &p)| p)
            .map(|(n, _)| n)
            .collect()
    }

    pub fn nb_instances(&self, app: usize) -> usize {
        self.placement[app].iter().filter(|&&p| p).count()
    }

    /// Sum of `resource` allocated at `node` across all applications.
    pub fn used(&self, node: usize, resource: usize) -> f64 {
        self.allocated.iter().map(|a| a[node][resource]).sum()
    }

    /// Sum of `resource` allocated at `node` by applications other than `app`.
    pub fn used_by_others(&self, app: usize, node: usize, resource: usize) -> f64 {
        self.allocated
            .iter()
            .enumerate()
            .filter(|(a, _)| *a != app)
            .map(|(_, alloc)| alloc[node][resource])
            .sum()
    }

    /// Total fraction of a source's load that has been dispatched.
    pub fn dispatched(&self, app: usize, src: usize) -> f64 {
        self.load_distribution[app][src].iter().sum()
    }

    /// Removes a replica and its allocation. Routing is left untouched.
    pub fn unplace(&mut self, app: usize, node: usize) {
        self.placement[app][node] = false;
        self.received_load[app][node] = 0.0;
        for a in &mut self.allocated[app][node] {
            *a = 0.0;
        }
    }
}
