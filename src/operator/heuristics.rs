//! Heuristic chromosomes for seeding the first population.
//!
//! Each builder returns a structured [`Chromosome`] that already encodes
//! a sensible decision, so the search starts near good regions rather
//! than from uniform noise.

use crate::kmedoids::{best_by_silhouette, KMedoids};
use crate::model::{EnvironmentInput, System};

use super::encoding::{Chromosome, ChromosomeLayout};

const MEDOID_ITERATIONS: usize = 100;
const DELAY_FLOOR: f64 = 1e-9;

/// The full seed set: net delay, medoids (fixed and silhouette-selected
/// cluster count), deadline, and cloud.
pub fn heuristic_chromosomes(system: &System, env: &EnvironmentInput) -> Vec<Chromosome> {
    vec![
        net_delay_chromosome(system, env),
        cluster_medoids_chromosome(system, env, false),
        cluster_medoids_chromosome(system, env, true),
        deadline_chromosome(system, env),
        cloud_chromosome(system),
    ]
}

/// Places replicas close to demand on average.
///
/// Placement priority is proportional to the inverse of the mean network
/// delay from the application's demand sources. Every application asks
/// for its full instance budget; heavier sources dispatch first.
pub fn net_delay_chromosome(system: &System, env: &EnvironmentInput) -> Chromosome {
    let mut genes = Chromosome::zeros(ChromosomeLayout::for_system(system));
    for app in 0..system.nb_apps() {
        genes.instance_fraction[app] = 1.0;
        genes.placement_priority[app] = proximity_to_demand(system, env, app);
    }
    genes.dispatch_priority = load_priority(env);
    genes
}

/// Places replicas near the medoids of the demand sources.
///
/// Sources are clustered with K-medoids on their pairwise network delay.
/// With `select_k` off, the cluster count is `min(sources, max_instances)`;
/// with it on, every count from 1 up to that bound is tried and the one
/// with the best silhouette score wins. Placement priority is the inverse
/// delay to the nearest medoid and the instance fraction asks for one
/// replica per cluster.
pub fn cluster_medoids_chromosome(system: &System, env: &EnvironmentInput, select_k: bool) -> Chromosome {
    let mut genes = Chromosome::zeros(ChromosomeLayout::for_system(system));
    for app in 0..system.nb_apps() {
        let sources = env.demand_sources(app);
        if sources.is_empty() {
            continue;
        }
        let distances: Vec<Vec<f64>> = sources
            .iter()
            .map(|&a| {
                sources
                    .iter()
                    .map(|&b| 0.5 * (env.delay(app, a, b) + env.delay(app, b, a)))
                    .collect()
            })
            .collect();
        let max_instances = system.apps[app].max_instances;
        let k_max = sources.len().min(max_instances);
        let clustering = if select_k {
            best_by_silhouette(&distances, 1, k_max, MEDOID_ITERATIONS).map(|(r, _)| r)
        } else {
            Some(
                KMedoids::new(k_max)
                    .with_max_iterations(MEDOID_ITERATIONS)
                    .fit(&distances),
            )
        };
        let Some(clustering) = clustering else {
            continue;
        };
        let medoids: Vec<usize> = clustering.medoids.iter().map(|&m| sources[m]).collect();

        genes.instance_fraction[app] = medoids.len() as f64 / max_instances as f64;
        genes.placement_priority[app] = normalize(
            (0..system.nb_nodes())
                .map(|n| {
                    let nearest = medoids
                        .iter()
                        .map(|&m| env.delay(app, m, n))
                        .fold(f64::INFINITY, f64::min);
                    1.0 / (nearest + DELAY_FLOOR)
                })
                .collect(),
        );
    }
    genes.dispatch_priority = load_priority(env);
    genes
}

/// Lets tight-deadline applications claim capacity first.
///
/// Dispatch priority is proportional to the inverse of the application
/// deadline; placement follows [`net_delay_chromosome`].
pub fn deadline_chromosome(system: &System, env: &EnvironmentInput) -> Chromosome {
    let mut genes = net_delay_chromosome(system, env);
    let tightest = system
        .apps
        .iter()
        .map(|a| a.deadline)
        .fold(f64::INFINITY, f64::min);
    for (app, spec) in system.apps.iter().enumerate() {
        let priority = tightest / spec.deadline;
        for src in 0..system.nb_nodes() {
            genes.dispatch_priority[app][src] = if env.generated_load[app][src] > 0.0 {
                priority
            } else {
                0.0
            };
        }
    }
    genes
}

/// All-zero chromosome: every application served from the cloud.
pub fn cloud_chromosome(system: &System) -> Chromosome {
    Chromosome::zeros(ChromosomeLayout::for_system(system))
}

/// Midpoint blends of every pair of seeds.
pub fn merged_chromosomes(seeds: &[Chromosome]) -> Vec<Chromosome> {
    let mut merged = Vec::new();
    for (i, a) in seeds.iter().enumerate() {
        for b in &seeds[i + 1..] {
            merged.push(a.blend(b, 0.5));
        }
    }
    merged
}

fn proximity_to_demand(system: &System, env: &EnvironmentInput, app: usize) -> Vec<f64> {
    let mut sources = env.demand_sources(app);
    if sources.is_empty() {
        sources = (0..system.nb_nodes()).collect();
    }
    normalize(
        (0..system.nb_nodes())
            .map(|n| {
                let mean = sources.iter().map(|&s| env.delay(app, s, n)).sum::<f64>() / sources.len() as f64;
                1.0 / (mean + DELAY_FLOOR)
            })
            .collect(),
    )
}

/// Dispatch priority proportional to each source's load, across all
/// applications.
fn load_priority(env: &EnvironmentInput) -> Vec<Vec<f64>> {
    let max = env
        .generated_load
        .iter()
        .flatten()
        .copied()
        .fold(0.0, f64::max);
    env.generated_load
        .iter()
        .map(|row| {
            row.iter()
                .map(|&l| if max > 0.0 { l / max } else { 0.0 })
                .collect()
        })
        .collect()
}

/// Scales scores into `[0, 1]` by their maximum.
fn normalize(scores: Vec<f64>) -> Vec<f64> {
    let max = scores
        .iter()
        .copied()
        .filter(|s| s.is_finite())
        .fold(0.0, f64::max);
    scores
        .into_iter()
        .map(|s| if max > 0.0 && s.is_finite() { s / max } else { 0.0 })
        .collect()
}
