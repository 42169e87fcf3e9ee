//! Criterion benchmarks for u-placement.
//!
//! Uses synthetic fleets (edge nodes on a line plus one cloud) so the
//! numbers reflect optimizer overhead rather than any particular
//! topology.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use u_placement::genetic::{GeneticConfig, Operator};
use u_placement::metrics::Objective;
use u_placement::model::{Application, EnvironmentInput, Node, Resource, ResourceFn, System};
use u_placement::operator::PlacementOperator;
use u_placement::optimizer::{
    CarryOverEstimator, LlcConfig, LlcOptimizer, MogaOptimizer, Optimizer, OptimizerConfig,
    PersistencePredictor,
};
use u_placement::random::{create_rng, random_keys};

// ===========================================================================
// Synthetic fleet
// ===========================================================================

const NB_APPS: usize = 3;

fn fleet(nb_edge: usize) -> System {
    let mut nodes: Vec<Node> = (0..nb_edge)
        .map(|i| {
            Node::new(format!("edge-{i}"), 2)
                .with_capacity(vec![40.0, 64.0])
                .with_cost(vec![ResourceFn::proportional(1.0), ResourceFn::proportional(0.1)])
                .with_availability(0.95)
        })
        .collect();
    nodes.push(
        Node::cloud("cloud", 2)
            .with_cost(vec![ResourceFn::proportional(3.0), ResourceFn::proportional(0.3)])
            .with_availability(0.999),
    );
    let apps = (0..NB_APPS)
        .map(|a| {
            Application::new(format!("app-{a}"), 2)
                .with_deadline(0.2 + 0.2 * a as f64)
                .with_data_size(10.0)
                .with_max_instances(3)
                .with_demand(vec![ResourceFn::proportional(1.5), ResourceFn::Constant(2.0)])
        })
        .collect();
    System::new(vec![Resource::cpu(), Resource::ram()], nodes, apps).expect("valid fleet")
}

fn environment(system: &System) -> EnvironmentInput {
    let n = system.nb_nodes();
    let cloud = system.cloud_index();
    let delays: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    if i == j {
                        0.0
                    } else if i == cloud || j == cloud {
                        0.4
                    } else {
                        0.005 * (i as f64 - j as f64).abs()
                    }
                })
                .collect()
        })
        .collect();
    let mut env = EnvironmentInput::for_system(system).with_delay_matrix(&delays);
    for app in 0..NB_APPS {
        for node in system.edge_nodes().filter(|node| (node + app) % 3 == 0) {
            env = env.with_load(app, node, 2.0 + (node % 4) as f64);
        }
        env = env.with_users(app, 20);
    }
    env
}

fn genetic() -> GeneticConfig {
    GeneticConfig::default()
        .with_population_size(40)
        .with_max_generations(20)
        .with_seed(42)
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for &n in &[8, 16, 32] {
        let system = fleet(n);
        let env = environment(&system);
        let objectives = [Objective::DeadlineViolation, Objective::OperationalCost];
        let op = PlacementOperator::new(&system, &env, &objectives);
        let keys = random_keys(op.chromosome_length(), &mut create_rng(42));
        group.bench_with_input(BenchmarkId::from_parameter(n), &keys, |b, k| {
            b.iter(|| black_box(op.decode(black_box(k))))
        });
    }
    group.finish();
}

fn bench_moga(c: &mut Criterion) {
    let mut group = c.benchmark_group("moga_solve");
    group.sample_size(10);
    for &n in &[8, 16] {
        let system = fleet(n);
        let env = environment(&system);
        let config = OptimizerConfig::default().with_genetic(genetic()).with_warm_start(false);
        group.bench_with_input(BenchmarkId::from_parameter(n), &config, |b, cfg| {
            b.iter(|| {
                let result = MogaOptimizer::new(cfg.clone()).solve(black_box(&system), black_box(&env));
                black_box(result)
            })
        });
    }
    group.finish();
}

fn bench_llc(c: &mut Criterion) {
    let mut group = c.benchmark_group("llc_solve");
    group.sample_size(10);
    let system = fleet(8);
    let env = environment(&system);
    for &window in &[1, 2] {
        let config = LlcConfig::default()
            .with_base(OptimizerConfig::default().with_genetic(genetic()).with_warm_start(false))
            .with_prediction_window(window);
        group.bench_with_input(BenchmarkId::from_parameter(window), &config, |b, cfg| {
            b.iter(|| {
                let mut llc = LlcOptimizer::new(cfg.clone(), PersistencePredictor, CarryOverEstimator);
                black_box(llc.solve(black_box(&system), black_box(&env)))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decode, bench_moga, bench_llc);
criterion_main!(benches);
