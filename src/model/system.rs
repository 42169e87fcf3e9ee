//! Fleet description: resources, nodes, applications.

use std::fmt;
use std::sync::Arc;

use crate::error::{PlacementError, Result};

use super::solution::OptSolution;

/// Category of a resource.
///
/// Processing delay is derived from the allocation of the first
/// [`ResourceKind::Cpu`] resource; other kinds only constrain capacity
/// and contribute to cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Cpu,
    Ram,
    Disk,
    Other,
}

/// A named, allocatable quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub name: String,
    pub kind: ResourceKind,
}

impl Resource {
    pub fn new(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn cpu() -> Self {
        Self::new("CPU", ResourceKind::Cpu)
    }

    pub fn ram() -> Self {
        Self::new("RAM", ResourceKind::Ram)
    }

    pub fn disk() -> Self {
        Self::new("DISK", ResourceKind::Disk)
    }
}

/// A scalar function used for resource demand (load → amount) and
/// resource cost (amount → cost).
///
/// Demand functions must be non-decreasing; repair relies on it.
#[derive(Clone)]
pub enum ResourceFn {
    /// Always returns the same value.
    Constant(f64),
    /// `slope * x + intercept`.
    Linear { slope: f64, intercept: f64 },
    /// Arbitrary function.
    Custom(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
}

impl ResourceFn {
    /// Shorthand for a line through the origin.
    pub fn proportional(slope: f64) -> Self {
        ResourceFn::Linear {
            slope,
            intercept: 0.0,
        }
    }

    pub fn eval(&self, x: f64) -> f64 {
        match self {
            ResourceFn::Constant(c) => *c,
            ResourceFn::Linear { slope, intercept } => slope * x + intercept,
            ResourceFn::Custom(f) => f(x),
        }
    }
}

impl fmt::Debug for ResourceFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceFn::Constant(c) => write!(f, "Constant({c})"),
            ResourceFn::Linear { slope, intercept } => {
                write!(f, "Linear {{ slope: {slope}, intercept: {intercept} }}")
            }
            ResourceFn::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// A compute node of the fleet.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    /// Whether this is the cloud node: the fallback host every decode
    /// may route load to.
    pub is_cloud: bool,
    /// Capacity per resource, indexed like [`System::resources`].
    pub capacity: Vec<f64>,
    /// Cost estimator per resource (allocated amount → cost).
    pub cost: Vec<ResourceFn>,
    /// Probability that the node is up during an epoch.
    pub availability: f64,
}

impl Node {
    /// Creates an edge node with zero capacity and zero cost for
    /// `nb_resources` resources.
    pub fn new(name: impl Into<String>, nb_resources: usize) -> Self {
        Self {
            name: name.into(),
            is_cloud: false,
            capacity: vec![0.0; nb_resources],
            cost: vec![ResourceFn::Constant(0.0); nb_resources],
            availability: 1.0,
        }
    }

    /// Creates a cloud node with unbounded capacity.
    pub fn cloud(name: impl Into<String>, nb_resources: usize) -> Self {
        Self {
            is_cloud: true,
            capacity: vec![f64::INFINITY; nb_resources],
            ..Self::new(name, nb_resources)
        }
    }

    pub fn with_capacity(mut self, capacity: Vec<f64>) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_cost(mut self, cost: Vec<ResourceFn>) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_availability(mut self, availability: f64) -> Self {
        self.availability = availability.clamp(0.0, 1.0);
        self
    }
}

/// An application whose replicas are placed on nodes.
#[derive(Debug, Clone)]
pub struct Application {
    pub name: String,
    /// Target response time in seconds.
    pub deadline: f64,
    /// Instructions per request.
    pub work_size: f64,
    /// State size moved when a replica migrates.
    pub data_size: f64,
    /// Nominal request rate per attached user.
    pub request_rate: f64,
    /// Upper bound on simultaneously hosting nodes.
    pub max_instances: usize,
    /// Demand per resource (received load → required amount).
    pub demand: Vec<ResourceFn>,
}

impl Application {
    pub fn new(name: impl Into<String>, nb_resources: usize) -> Self {
        Self {
            name: name.into(),
            deadline: 1.0,
            work_size: 1.0,
            data_size: 0.0,
            request_rate: 1.0,
            max_instances: 1,
            demand: vec![ResourceFn::Constant(0.0); nb_resources],
        }
    }

    pub fn with_deadline(mut self, deadline: f64) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_work_size(mut self, work_size: f64) -> Self {
        self.work_size = work_size;
        self
    }

    pub fn with_data_size(mut self, data_size: f64) -> Self {
        self.data_size = data_size;
        self
    }

    pub fn with_request_rate(mut self, rate: f64) -> Self {
        self.request_rate = rate;
        self
    }

    pub fn with_max_instances(mut self, n: usize) -> Self {
        self.max_instances = n;
        self
    }

    pub fn with_demand(mut self, demand: Vec<ResourceFn>) -> Self {
        self.demand = demand;
        self
    }

    /// Required amount of `resource` to serve `load`.
    pub fn demand_of(&self, resource: usize, load: f64) -> f64 {
        self.demand[resource].eval(load).max(0.0)
    }
}

/// Read-only view of the fleet at one control epoch.
#[derive(Debug, Clone)]
pub struct System {
    pub time: f64,
    pub sampling_interval: f64,
    pub resources: Vec<Resource>,
    pub nodes: Vec<Node>,
    pub apps: Vec<Application>,
    /// Decision applied in the previous epoch, used for migration cost.
    pub previous: Option<OptSolution>,
    cloud: usize,
    cpu: Option<usize>,
}

impl System {
    /// Builds a validated system.
    ///
    /// Requires at least one resource, exactly one cloud node, and
    /// per-resource vectors of matching length on every node and
    /// application.
    pub fn new(resources: Vec<Resource>, nodes: Vec<Node>, apps: Vec<Application>) -> Result<Self> {
        if resources.is_empty() {
            return Err(PlacementError::InvalidModel("at least one resource is required".into()));
        }
        let clouds: Vec<usize> = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_cloud)
            .map(|(i, _)| i)
            .collect();
        if clouds.len() != 1 {
            return Err(PlacementError::InvalidModel(format!(
                "exactly one cloud node is required, found {}",
                clouds.len()
            )));
        }
        let nb_res = resources.len();
        for node in &nodes {
            if node.capacity.len() != nb_res || node.cost.len() != nb_res {
                return Err(PlacementError::InvalidModel(format!(
                    "node {} must describe {nb_res} resources",
                    node.name
                )));
            }
        }
        for app in &apps {
            if app.demand.len() != nb_res {
                return Err(PlacementError::InvalidModel(format!(
                    "application {} must describe {nb_res} resources",
                    app.name
                )));
            }
            if app.max_instances == 0 {
                return Err(PlacementError::InvalidModel(format!(
                    "application {} must allow at least one instance",
                    app.name
                )));
            }
            if app.deadline.is_nan() || app.deadline <= 0.0 || app.work_size.is_nan() || app.work_size <= 0.0 {
                return Err(PlacementError::InvalidModel(format!(
                    "application {} needs a positive deadline and work size",
                    app.name
                )));
            }
        }
        let cpu = resources.iter().position(|r| r.kind == ResourceKind::Cpu);
        Ok(Self {
            time: 0.0,
            sampling_interval: 1.0,
            resources,
            nodes,
            apps,
            previous: None,
            cloud: clouds[0],
            cpu,
        })
    }

    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    pub fn with_sampling_interval(mut self, interval: f64) -> Self {
        self.sampling_interval = interval;
        self
    }

    pub fn with_previous(mut self, previous: OptSolution) -> Self {
        self.previous = Some(previous);
        self
    }

    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn nb_apps(&self) -> usize {
        self.apps.len()
    }

    pub fn nb_resources(&self) -> usize {
        self.resources.len()
    }

    /// Index of the cloud node.
    pub fn cloud_index(&self) -> usize {
        self.cloud
    }

    /// Index of the resource that drives processing delay, if any.
    pub fn cpu_index(&self) -> Option<usize> {
        self.cpu
    }

    /// Indices of all non-cloud nodes.
    pub fn edge_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.nodes.len()).filter(move |&n| n != self.cloud)
    }
}
