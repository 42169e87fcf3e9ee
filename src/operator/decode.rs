//! Greedy chunked decode of a placement chromosome.

use rand::Rng;
use tracing::warn;

use crate::genetic::Operator;
use crate::metrics::{estimate_response_time, evaluate_objectives, Objective};
use crate::model::{EnvironmentInput, OptSolution, System};

use super::encoding::{Chromosome, ChromosomeLayout};
use super::heuristics::heuristic_chromosomes;
use super::repair::{assign, fits, make_solution_feasible, validate_solution};

/// Default share of a source's load placed per decode step.
pub const DEFAULT_CHUNK_FRACTION: f64 = 0.1;

const DONE: f64 = 1e-9;

/// Placement operator bound to one epoch's system and environment.
///
/// Decoding proceeds in three steps:
///
/// 1. **Candidates**: each application's edge nodes able to host at
///    least one load chunk are ranked by placement priority; the top
///    `ceil(instance_fraction * max_instances)` become candidate hosts.
/// 2. **Requests**: every `(app, source)` pair with load is ordered by
///    dispatch priority, highest first.
/// 3. **Chunks**: each request ranks its candidates by estimated
///    response time, appends the cloud, and hands out its load in
///    chunks; a chunk goes to the first host whose capacity still holds.
///
/// The result is then passed through [`make_solution_feasible`].
pub struct PlacementOperator<'a> {
    system: &'a System,
    env: &'a EnvironmentInput,
    objectives: &'a [Objective],
    layout: ChromosomeLayout,
    chunk_fraction: f64,
    weights: Option<Vec<f64>>,
    heuristic_seeds: bool,
}

impl<'a> PlacementOperator<'a> {
    pub fn new(system: &'a System, env: &'a EnvironmentInput, objectives: &'a [Objective]) -> Self {
        Self {
            system,
            env,
            objectives,
            layout: ChromosomeLayout::for_system(system),
            chunk_fraction: DEFAULT_CHUNK_FRACTION,
            weights: None,
            heuristic_seeds: true,
        }
    }

    /// Sets the chunk granularity. Values outside `(0, 1]` fall back to
    /// the default.
    pub fn with_chunk_fraction(mut self, fraction: f64) -> Self {
        self.chunk_fraction = if fraction > 0.0 && fraction <= 1.0 {
            fraction
        } else {
            DEFAULT_CHUNK_FRACTION
        };
        self
    }

    /// Multiplies each objective by a weight, so that the sum of the
    /// evaluated vector is a weighted sum (single-objective mode).
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_heuristic_seeds(mut self, enabled: bool) -> Self {
        self.heuristic_seeds = enabled;
        self
    }

    pub fn layout(&self) -> ChromosomeLayout {
        self.layout
    }

    pub fn system(&self) -> &'a System {
        self.system
    }

    pub fn env(&self) -> &'a EnvironmentInput {
        self.env
    }

    /// Objective vector of a decision, weighted if weights are set.
    pub fn score(&self, sol: &OptSolution) -> Vec<f64> {
        let mut values = evaluate_objectives(self.objectives, self.system, sol, self.env);
        if let Some(w) = &self.weights {
            for (v, w) in values.iter_mut().zip(w) {
                *v *= w;
            }
        }
        values
    }

    /// Decodes a structured chromosome without repair.
    pub fn decode_greedy(&self, genes: &Chromosome) -> OptSolution {
        let system = self.system;
        let env = self.env;
        let mut sol = OptSolution::new(system.nb_apps(), system.nb_nodes(), system.nb_resources());

        let candidates: Vec<Vec<usize>> = (0..system.nb_apps())
            .map(|app| self.candidate_hosts(genes, app))
            .collect();

        let mut requests: Vec<(usize, usize)> = (0..system.nb_apps())
            .flat_map(|app| env.demand_sources(app).into_iter().map(move |src| (app, src)))
            .collect();
        requests.sort_by(|&(a1, s1), &(a2, s2)| {
            genes.dispatch_priority[a2][s2].total_cmp(&genes.dispatch_priority[a1][s1])
        });

        let cloud = system.cloud_index();
        for (app, src) in requests {
            let load = env.generated_load[app][src];
            let chunk = self.chunk_fraction * load;

            let mut ranked: Vec<(usize, f64)> = candidates[app]
                .iter()
                .map(|&h| (h, self.estimate(&sol, app, src, h, chunk)))
                .collect();
            ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
            let mut hosts: Vec<usize> = ranked.into_iter().map(|(h, _)| h).collect();
            hosts.push(cloud);

            let mut remaining = 1.0_f64;
            while remaining > DONE {
                let fraction = self.chunk_fraction.min(remaining);
                let accepted = hosts.iter().find_map(|&h| {
                    fits(system, &sol, app, h, fraction * load).map(|alloc| (h, alloc))
                });
                let Some((host, alloc)) = accepted else {
                    break;
                };
                assign(&mut sol, app, src, host, fraction, load, alloc);
                remaining -= fraction;
            }
        }
        sol
    }

    /// Edge nodes selected as candidate hosts for `app`, best first.
    fn candidate_hosts(&self, genes: &Chromosome, app: usize) -> Vec<usize> {
        let system = self.system;
        let spec = &system.apps[app];
        let smallest_load = self.env.generated_load[app]
            .iter()
            .copied()
            .filter(|&l| l > 0.0)
            .fold(f64::INFINITY, f64::min);
        let probe = if smallest_load.is_finite() {
            self.chunk_fraction * smallest_load
        } else {
            0.0
        };

        let mut eligible: Vec<usize> = system
            .edge_nodes()
            .filter(|&n| {
                system.nodes[n]
                    .capacity
                    .iter()
                    .enumerate()
                    .all(|(r, &cap)| spec.demand_of(r, probe) <= cap)
            })
            .collect();
        let priority = &genes.placement_priority[app];
        eligible.sort_by(|&a, &b| priority[b].total_cmp(&priority[a]));

        let wanted = (genes.instance_fraction[app] * spec.max_instances as f64).ceil() as usize;
        eligible.truncate(wanted.min(spec.max_instances));
        eligible
    }

    fn estimate(&self, sol: &OptSolution, app: usize, src: usize, host: usize, chunk: f64) -> f64 {
        let load = sol.received_load[app][host] + chunk;
        let cpu = self
            .system
            .cpu_index()
            .map_or(0.0, |r| self.system.apps[app].demand_of(r, load));
        estimate_response_time(self.system, self.env, app, src, host, load, cpu)
    }
}

impl Operator for PlacementOperator<'_> {
    type Decision = OptSolution;

    fn chromosome_length(&self) -> usize {
        self.layout.len()
    }

    fn decode(&self, keys: &[f64]) -> OptSolution {
        let genes = self.layout.unflatten(keys);
        let mut sol = self.decode_greedy(&genes);
        make_solution_feasible(self.system, self.env, &mut sol);
        sol
    }

    fn evaluate(&self, keys: &[f64]) -> Vec<f64> {
        let sol = self.decode(keys);
        if let Err(e) = validate_solution(self.system, &sol) {
            warn!(error = %e, "repaired decision failed validation");
            return vec![f64::INFINITY; self.objectives.len().max(1)];
        }
        self.score(&sol)
    }

    fn seed_population<R: Rng>(&self, _rng: &mut R) -> Vec<Vec<f64>> {
        if !self.heuristic_seeds {
            return Vec::new();
        }
        heuristic_chromosomes(self.system, self.env)
            .iter()
            .map(Chromosome::flatten)
            .collect()
    }
}
