//! Structured chromosome for placement decisions.
//!
//! The genetic engine only sees a flat key vector. Everything else in
//! the crate reads genes through [`Chromosome`], whose typed fields
//! replace offset arithmetic:
//!
//! ```text
//! [ instance_fraction[app] | placement_priority[app][node] | dispatch_priority[app][src] ]
//!     nb_apps                   nb_apps * nb_nodes             nb_apps * nb_nodes
//! ```

use crate::model::System;

/// Dimensions of the flat encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromosomeLayout {
    pub nb_apps: usize,
    pub nb_nodes: usize,
}

impl ChromosomeLayout {
    pub fn new(nb_apps: usize, nb_nodes: usize) -> Self {
        Self { nb_apps, nb_nodes }
    }

    pub fn for_system(system: &System) -> Self {
        Self::new(system.nb_apps(), system.nb_nodes())
    }

    /// Number of keys in the flat encoding.
    pub fn len(&self) -> usize {
        self.nb_apps * (1 + 2 * self.nb_nodes)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads a flat key vector. Missing keys read as 0 and extra keys
    /// are ignored.
    pub fn unflatten(&self, keys: &[f64]) -> Chromosome {
        let key = |i: usize| keys.get(i).copied().unwrap_or(0.0);
        let (apps, nodes) = (self.nb_apps, self.nb_nodes);
        let placement_base = apps;
        let dispatch_base = apps + apps * nodes;
        Chromosome {
            instance_fraction: (0..apps).map(key).collect(),
            placement_priority: (0..apps)
                .map(|a| (0..nodes).map(|n| key(placement_base + a * nodes + n)).collect())
                .collect(),
            dispatch_priority: (0..apps)
                .map(|a| (0..nodes).map(|n| key(dispatch_base + a * nodes + n)).collect())
                .collect(),
        }
    }
}

/// Typed view of a placement chromosome. All genes lie in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Chromosome {
    /// `[app]` fraction of `max_instances` to place.
    pub instance_fraction: Vec<f64>,
    /// `[app][node]` preference for hosting a replica on the node.
    pub placement_priority: Vec<Vec<f64>>,
    /// `[app][src]` order in which the source's load claims capacity.
    pub dispatch_priority: Vec<Vec<f64>>,
}

impl Chromosome {
    /// All-zero chromosome: no edge replicas, everything to the cloud.
    pub fn zeros(layout: ChromosomeLayout) -> Self {
        Self {
            instance_fraction: vec![0.0; layout.nb_apps],
            placement_priority: vec![vec![0.0; layout.nb_nodes]; layout.nb_apps],
            dispatch_priority: vec![vec![0.0; layout.nb_nodes]; layout.nb_apps],
        }
    }

    pub fn layout(&self) -> ChromosomeLayout {
        ChromosomeLayout::new(
            self.instance_fraction.len(),
            self.placement_priority.first().map_or(0, Vec::len),
        )
    }

    /// Flat key vector for the genetic engine, clamped to `[0, 1]`.
    pub fn flatten(&self) -> Vec<f64> {
        let mut keys = Vec::with_capacity(self.layout().len());
        keys.extend_from_slice(&self.instance_fraction);
        keys.extend(self.placement_priority.iter().flatten());
        keys.extend(self.dispatch_priority.iter().flatten());
        for k in &mut keys {
            *k = if k.is_nan() { 0.0 } else { k.clamp(0.0, 1.0) };
        }
        keys
    }

    /// Gene-wise arithmetic blend `w * self + (1 - w) * other`.
    pub fn blend(&self, other: &Chromosome, w: f64) -> Chromosome {
        let mix = |a: &f64, b: &f64| w * a + (1.0 - w) * b;
        let mix_rows = |a: &Vec<Vec<f64>>, b: &Vec<Vec<f64>>| {
            a.iter()
                .zip(b)
                .map(|(ra, rb)| ra.iter().zip(rb).map(|(x, y)| mix(x, y)).collect())
                .collect()
        };
        Chromosome {
            instance_fraction: self
                .instance_fraction
                .iter()
                .zip(&other.instance_fraction)
                .map(|(a, b)| mix(a, b))
                .collect(),
            placement_priority: mix_rows(&self.placement_priority, &other.placement_priority),
            dispatch_priority: mix_rows(&self.dispatch_priority, &other.dispatch_priority),
        }
    }
}
