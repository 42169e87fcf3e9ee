//! Shared fleets for unit tests.

use crate::metrics::Objective;
use crate::model::{Application, EnvironmentInput, Node, Resource, ResourceFn, System};
use crate::operator::{heuristic_chromosomes, Chromosome};
use crate::optimizer::CarryOverEstimator;
use crate::plan::{ControlDecoder, PlacementDecoder, PlanAggregation, PlanContext};

/// Routes `tracing` output to the test harness. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One application, two edge nodes and a cloud, CPU only.
///
/// - node 0 / node 1: 100 CPU, cost 1 per unit, availability 0.9
/// - node 2: cloud, cost 2 per unit, availability 0.99
/// - app 0: deadline 0.5 s, CPU demand `2 * load`, up to 2 instances
pub fn one_app_system() -> System {
    let nodes = vec![
        Node::new("edge-a", 1)
            .with_capacity(vec![100.0])
            .with_cost(vec![ResourceFn::proportional(1.0)])
            .with_availability(0.9),
        Node::new("edge-b", 1)
            .with_capacity(vec![100.0])
            .with_cost(vec![ResourceFn::proportional(1.0)])
            .with_availability(0.9),
        Node::cloud("cloud", 1)
            .with_cost(vec![ResourceFn::proportional(2.0)])
            .with_availability(0.99),
    ];
    let apps = vec![Application::new("app", 1)
        .with_deadline(0.5)
        .with_data_size(10.0)
        .with_max_instances(2)
        .with_demand(vec![ResourceFn::proportional(2.0)])];
    System::new(vec![Resource::cpu()], nodes, apps).expect("valid fixture")
}

/// Load of 5 req/s at node 0; node 1 is 10 ms away, the cloud 2 s away.
pub fn two_node_env(system: &System) -> EnvironmentInput {
    EnvironmentInput::for_system(system)
        .with_load(0, 0, 5.0)
        .with_delay(0, 0, 1, 0.01)
        .with_delay(0, 0, 2, 2.0)
        .with_delay(0, 1, 2, 2.0)
        .with_users(0, 10)
}

/// Two applications on four edge nodes plus a cloud, CPU and RAM.
///
/// Edge nodes sit on a line (node i to node j costs `0.01 * |i - j|`),
/// the cloud is 0.5 s from everything. Edge CPU is tight enough that
/// not all load fits at the edge.
pub fn small_fleet() -> System {
    let edge = |name: &str, cpu: f64| {
        Node::new(name, 2)
            .with_capacity(vec![cpu, 64.0])
            .with_cost(vec![ResourceFn::proportional(1.0), ResourceFn::proportional(0.1)])
            .with_availability(0.95)
    };
    let nodes = vec![
        edge("e0", 30.0),
        edge("e1", 30.0),
        edge("e2", 20.0),
        edge("e3", 20.0),
        Node::cloud("cloud", 2)
            .with_cost(vec![ResourceFn::proportional(3.0), ResourceFn::proportional(0.3)])
            .with_availability(0.999),
    ];
    let apps = vec![
        Application::new("video", 2)
            .with_deadline(0.3)
            .with_data_size(50.0)
            .with_max_instances(2)
            .with_demand(vec![
                ResourceFn::proportional(2.0),
                ResourceFn::Linear {
                    slope: 0.5,
                    intercept: 1.0,
                },
            ]),
        Application::new("sensor", 2)
            .with_deadline(1.0)
            .with_data_size(5.0)
            .with_max_instances(3)
            .with_demand(vec![ResourceFn::proportional(1.5), ResourceFn::Constant(2.0)]),
    ];
    System::new(vec![Resource::cpu(), Resource::ram()], nodes, apps).expect("valid fixture")
}

/// Demand spread over the edge for [`small_fleet`].
pub fn small_fleet_env(system: &System) -> EnvironmentInput {
    let n = system.nb_nodes();
    let cloud = system.cloud_index();
    let mut delays = vec![vec![0.0; n]; n];
    for (i, row) in delays.iter_mut().enumerate() {
        for (j, d) in row.iter_mut().enumerate() {
            *d = if i == j {
                0.0
            } else if i == cloud || j == cloud {
                0.5
            } else {
                0.01 * (i as f64 - j as f64).abs()
            };
        }
    }
    EnvironmentInput::for_system(system)
        .with_delay_matrix(&delays)
        .with_load(0, 0, 6.0)
        .with_load(0, 1, 4.0)
        .with_load(0, 3, 5.0)
        .with_load(1, 1, 3.0)
        .with_load(1, 2, 2.0)
        .with_users(0, 30)
        .with_users(1, 10)
}

/// [`small_fleet_env`] with every load scaled by `factor`.
pub fn scaled_env(system: &System, factor: f64) -> EnvironmentInput {
    let mut env = small_fleet_env(system);
    for row in &mut env.generated_load {
        for l in row.iter_mut() {
            *l *= factor;
        }
    }
    env
}

/// [`small_fleet`] with a forecast whose load grows 50% per stage.
pub struct PlanFixture {
    pub system: System,
    pub decoder: PlacementDecoder,
    pub estimator: CarryOverEstimator,
    pub aggregation: PlanAggregation,
}

impl PlanFixture {
    pub fn new(nb_stages: usize) -> Self {
        let system = small_fleet();
        let stages = (0..nb_stages)
            .map(|k| scaled_env(&system, 1.0 + 0.5 * k as f64))
            .collect();
        let objectives = vec![
            Objective::DeadlineViolation,
            Objective::OperationalCost,
            Objective::MigrationCost,
        ];
        Self {
            decoder: PlacementDecoder::new(stages, objectives),
            system,
            estimator: CarryOverEstimator,
            aggregation: PlanAggregation::Sum,
        }
    }

    pub fn context<'a>(&'a self, pool: &'a [Vec<f64>]) -> PlanContext<'a> {
        PlanContext::new(&self.system, pool, &self.decoder, &self.estimator, &self.aggregation)
    }
}

/// Heuristic chromosomes of the fixture's first stage.
pub fn plan_pool(fx: &PlanFixture) -> Vec<Vec<f64>> {
    heuristic_chromosomes(&fx.system, fx.decoder.environment(0))
        .iter()
        .map(Chromosome::flatten)
        .collect()
}
