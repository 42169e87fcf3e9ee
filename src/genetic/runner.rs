//! Evolutionary loop.
//!
//! One generation: copy elites, inject random mutants, fill the rest by
//! biased uniform crossover (one elite and one non-elite parent), then
//! evaluate the newcomers and re-rank.

use std::collections::VecDeque;
use std::time::Instant;

use rand::Rng;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, trace};

use crate::error::{PlacementError, Result};
use crate::random::{random_keys, rng_from};

use super::config::GeneticConfig;
use super::dominance::DominanceKind;
use super::multi_objective::rank_order;
use super::types::{Individual, Operator};

/// How a population is ordered each generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ranking {
    /// Ascending by the sum of objectives (single-objective mode).
    Scalar,
    /// Non-dominated fronts, crowding distance within a front.
    Dominance(DominanceKind),
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `max_generations` reached.
    Generations,
    /// Best value variance over the stall window fell below the threshold.
    Stalled,
    /// Wall-clock guard tripped.
    TimeLimit,
    /// The operator's own stopping criterion fired.
    Operator,
    /// Empty population or every individual identical.
    Degenerate,
}

/// Result of a genetic run.
#[derive(Debug, Clone)]
pub struct GeneticResult {
    /// Final population, best first.
    pub population: Vec<Individual>,

    /// Number of leading individuals in the first front (1 in scalar mode).
    pub front_size: usize,

    /// Generations executed after the initial population.
    pub generations: usize,

    pub stop_reason: StopReason,

    /// Scalar value of the best individual after each generation,
    /// starting with the initial population.
    pub best_history: Vec<f64>,
}

impl GeneticResult {
    pub fn best(&self) -> Option<&Individual> {
        self.population.first()
    }

    /// The first front (Pareto-optimal set under the run's ranking).
    pub fn front(&self) -> &[Individual] {
        &self.population[..self.front_size.min(self.population.len())]
    }

    /// True when the wall-clock guard cut the run short.
    pub fn timed_out(&self) -> bool {
        self.stop_reason == StopReason::TimeLimit
    }
}

/// Executes the genetic engine.
///
/// # Usage
///
/// ```ignore
/// let config = GeneticConfig::default().with_seed(42);
/// let result = GeneticRunner::run(&operator, &config, Ranking::Scalar)?;
/// let best = result.best().expect("non-empty population");
/// ```
pub struct GeneticRunner;

impl GeneticRunner {
    /// Runs the engine from the operator's seeds plus random keys.
    pub fn run<O: Operator>(operator: &O, config: &GeneticConfig, ranking: Ranking) -> Result<GeneticResult> {
        Self::run_seeded(operator, config, ranking, Vec::new())
    }

    /// Runs the engine with extra initial chromosomes (e.g. the previous
    /// epoch's population). The operator's seeds always enter the first
    /// population; `initial` only fills the slots they leave free.
    pub fn run_seeded<O: Operator>(
        operator: &O,
        config: &GeneticConfig,
        ranking: Ranking,
        initial: Vec<Vec<f64>>,
    ) -> Result<GeneticResult> {
        config.validate()?;
        let started = Instant::now();
        let mut rng = rng_from(config.seed);
        let pool = build_pool(config)?;

        let n = operator.chromosome_length();
        let pop_size = config.population_size;
        let elite_count = config.elite_count();
        let mutant_count = config.mutant_count();
        let crossover_count = pop_size - elite_count - mutant_count;

        // 1. Initial population: heuristic seeds keep their slots, warm
        //    start fills what is left, random keys pad the rest
        let seeds: Vec<Vec<f64>> = operator
            .seed_population(&mut rng)
            .into_iter()
            .filter(|keys| keys.len() == n)
            .collect();
        let room = pop_size.saturating_sub(seeds.len());
        let offered = initial.len();
        let carried: Vec<Vec<f64>> = initial.into_iter().filter(|keys| keys.len() == n).take(room).collect();
        if carried.len() < offered {
            debug!(offered, carried = carried.len(), seeds = seeds.len(), "warm start capped");
        }
        let mut population: Vec<Individual> = carried
            .into_iter()
            .chain(seeds)
            .take(pop_size)
            .map(Individual::new)
            .collect();
        while population.len() < pop_size {
            population.push(Individual::new(random_keys(n, &mut rng)));
        }

        // 2-3. Evaluate and rank
        evaluate_population(operator, &mut population, config.parallel, pool.as_ref());
        let mut front_size = rank(&mut population, ranking);

        let mut best_history = Vec::with_capacity(config.max_generations + 1);
        let mut window = VecDeque::with_capacity(config.stall_window);
        if let Some(best) = population.first() {
            best_history.push(best.scalar());
            push_window(&mut window, best.scalar(), config.stall_window);
        }

        debug!(
            population = pop_size,
            genes = n,
            max_generations = config.max_generations,
            "genetic run started"
        );

        let mut stop_reason = StopReason::Generations;
        let mut generations = 0usize;

        // 4-5. Evolutionary loop
        while generations < config.max_generations {
            if is_degenerate(&population) {
                stop_reason = StopReason::Degenerate;
                break;
            }
            if let Some(limit) = config.time_limit_ms {
                if started.elapsed().as_millis() >= u128::from(limit) {
                    stop_reason = StopReason::TimeLimit;
                    break;
                }
            }
            if operator.should_stop(generations, &population) {
                stop_reason = StopReason::Operator;
                break;
            }
            if is_stalled(&window, config) {
                stop_reason = StopReason::Stalled;
                break;
            }

            let mut next_gen: Vec<Individual> = Vec::with_capacity(pop_size);

            // Phase 1: Elite copy
            next_gen.extend(population.iter().take(elite_count).cloned());

            // Phase 2: Mutant injection
            for _ in 0..mutant_count {
                next_gen.push(Individual::new(random_keys(n, &mut rng)));
            }

            // Phase 3: Biased uniform crossover
            for _ in 0..crossover_count {
                let elite_idx = rng.random_range(0..elite_count);
                let other_idx = if elite_count < pop_size {
                    rng.random_range(elite_count..pop_size)
                } else {
                    rng.random_range(0..pop_size)
                };
                let elite = population[elite_idx].keys();
                let other = population[other_idx].keys();
                let keys: Vec<f64> = (0..n)
                    .map(|j| {
                        if rng.random_range(0.0..1.0) < config.elite_inheritance_prob {
                            elite[j]
                        } else {
                            other[j]
                        }
                    })
                    .collect();
                next_gen.push(Individual::new(keys));
            }

            evaluate_population(operator, &mut next_gen, config.parallel, pool.as_ref());
            front_size = rank(&mut next_gen, ranking);
            population = next_gen;
            generations += 1;

            let best = population[0].scalar();
            best_history.push(best);
            push_window(&mut window, best, config.stall_window);
            trace!(generation = generations, best, front = front_size, "generation done");
        }

        if population.is_empty() {
            stop_reason = StopReason::Degenerate;
        }
        debug!(generations, ?stop_reason, "genetic run finished");

        Ok(GeneticResult {
            population,
            front_size,
            generations,
            stop_reason,
            best_history,
        })
    }
}

/// Sorts `population` best-first in place and returns the first-front size.
pub fn rank(population: &mut Vec<Individual>, ranking: Ranking) -> usize {
    if population.is_empty() {
        return 0;
    }
    match ranking {
        Ranking::Scalar => {
            population.sort_by(|a, b| a.scalar().total_cmp(&b.scalar()));
            1
        }
        Ranking::Dominance(kind) => {
            let objectives: Vec<Vec<f64>> = population.iter().map(Individual::objectives).collect();
            let (order, front) = rank_order(&objectives, kind);
            let mut slots: Vec<Option<Individual>> = population.drain(..).map(Some).collect();
            population.extend(order.into_iter().filter_map(|i| slots[i].take()));
            front
        }
    }
}

fn build_pool(config: &GeneticConfig) -> Result<Option<ThreadPool>> {
    match (config.parallel, config.pool_size) {
        (true, Some(workers)) => ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map(Some)
            .map_err(|e| PlacementError::ThreadPool(e.to_string())),
        _ => Ok(None),
    }
}

/// Evaluates every individual whose fitness is not cached.
///
/// Results land in each individual's own slot, so input order is kept
/// regardless of how the pool schedules work.
fn evaluate_population<O: Operator>(
    operator: &O,
    population: &mut [Individual],
    parallel: bool,
    pool: Option<&ThreadPool>,
) {
    let eval = |ind: &mut Individual| {
        if !ind.is_evaluated() {
            let f = operator.evaluate(ind.keys());
            ind.set_fitness(f);
        }
    };
    match (parallel, pool) {
        (true, Some(pool)) => pool.install(|| population.par_iter_mut().for_each(eval)),
        (true, None) => population.par_iter_mut().for_each(eval),
        (false, _) => population.iter_mut().for_each(eval),
    }
}

fn is_degenerate(population: &[Individual]) -> bool {
    match population.split_first() {
        None => true,
        Some((first, rest)) => !rest.is_empty() && rest.iter().all(|ind| ind.keys() == first.keys()),
    }
}

fn push_window(window: &mut VecDeque<f64>, value: f64, capacity: usize) {
    if capacity == 0 {
        return;
    }
    if window.len() == capacity {
        window.pop_front();
    }
    window.push_back(value);
}

fn is_stalled(window: &VecDeque<f64>, config: &GeneticConfig) -> bool {
    if config.stall_window == 0 || window.len() < config.stall_window {
        return false;
    }
    if window.iter().all(|v| v.is_infinite()) {
        return true;
    }
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.is_finite() && variance <= config.stall_threshold
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ---- OneMax via threshold: keys > 0.5 = 1, minimize negative count ----

    struct OneMax {
        n: usize,
    }

    impl Operator for OneMax {
        type Decision = usize;

        fn chromosome_length(&self) -> usize {
            self.n
        }

        fn decode(&self, keys: &[f64]) -> usize {
            keys.iter().filter(|&&k| k > 0.5).count()
        }

        fn evaluate(&self, keys: &[f64]) -> Vec<f64> {
            vec![-(self.decode(keys) as f64)]
        }
    }

    // ---- Two conflicting objectives on one key ----

    struct Schaffer;

    impl Operator for Schaffer {
        type Decision = f64;

        fn chromosome_length(&self) -> usize {
            1
        }

        fn decode(&self, keys: &[f64]) -> f64 {
            keys[0] * 4.0 - 2.0
        }

        fn evaluate(&self, keys: &[f64]) -> Vec<f64> {
            let x = self.decode(keys);
            vec![x * x, (x - 2.0) * (x - 2.0)]
        }
    }

    fn config() -> GeneticConfig {
        GeneticConfig::default()
            .with_population_size(40)
            .with_max_generations(60)
            .with_stall_window(0)
            .with_seed(42)
            .with_parallel(false)
    }

    #[test]
    fn test_onemax_converges() {
        let cfg = config().with_population_size(50).with_max_generations(100);
        let result = GeneticRunner::run(&OneMax { n: 20 }, &cfg, Ranking::Scalar).unwrap();
        let best = result.best().unwrap();
        assert!(best.scalar() <= -15.0, "got {}", best.scalar());
        assert_eq!(result.front_size, 1);
        assert_eq!(result.stop_reason, StopReason::Generations);
        assert_eq!(result.best_history.len(), 101);
    }

    #[test]
    fn test_best_is_monotonic() {
        let result = GeneticRunner::run(&OneMax { n: 10 }, &config(), Ranking::Scalar).unwrap();
        for w in result.best_history.windows(2) {
            assert!(w[1] <= w[0], "elitism must keep the best: {} > {}", w[1], w[0]);
        }
    }

    #[test]
    fn test_population_sorted_best_first() {
        let result = GeneticRunner::run(&OneMax { n: 12 }, &config(), Ranking::Scalar).unwrap();
        for w in result.population.windows(2) {
            assert!(w[0].scalar() <= w[1].scalar());
        }
        assert_eq!(result.population.len(), 40);
    }

    #[test]
    fn test_same_seed_same_result() {
        let a = GeneticRunner::run(&OneMax { n: 12 }, &config(), Ranking::Scalar).unwrap();
        let b = GeneticRunner::run(&OneMax { n: 12 }, &config(), Ranking::Scalar).unwrap();
        assert_eq!(a.population, b.population);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let seq = GeneticRunner::run(&OneMax { n: 12 }, &config(), Ranking::Scalar).unwrap();
        let par_config = config().with_parallel(true).with_pool_size(3);
        let par = GeneticRunner::run(&OneMax { n: 12 }, &par_config, Ranking::Scalar).unwrap();
        assert_eq!(seq.population, par.population);
    }

    #[test]
    fn test_stall_stops_early() {
        let cfg = config()
            .with_max_generations(1000)
            .with_stall_window(5)
            .with_stall_threshold(1e-9);
        let result = GeneticRunner::run(&OneMax { n: 5 }, &cfg, Ranking::Scalar).unwrap();
        assert_eq!(result.stop_reason, StopReason::Stalled);
        assert!(result.generations < 1000);
    }

    #[test]
    fn test_empty_population_terminates() {
        let cfg = config().with_population_size(0);
        let result = GeneticRunner::run(&OneMax { n: 5 }, &cfg, Ranking::Scalar).unwrap();
        assert!(result.population.is_empty());
        assert_eq!(result.generations, 0);
        assert_eq!(result.stop_reason, StopReason::Degenerate);
        assert!(result.best().is_none());
    }

    #[test]
    fn test_identical_population_terminates() {
        struct Constant;
        impl Operator for Constant {
            type Decision = ();
            fn chromosome_length(&self) -> usize {
                3
            }
            fn decode(&self, _keys: &[f64]) {}
            fn evaluate(&self, _keys: &[f64]) -> Vec<f64> {
                vec![1.0]
            }
            fn seed_population<R: rand::Rng>(&self, _rng: &mut R) -> Vec<Vec<f64>> {
                vec![vec![0.5; 3]; 10]
            }
        }
        let cfg = config().with_population_size(10);
        let result = GeneticRunner::run(&Constant, &cfg, Ranking::Scalar).unwrap();
        assert_eq!(result.stop_reason, StopReason::Degenerate);
        assert_eq!(result.generations, 0);
    }

    #[test]
    fn test_nan_fitness_ranks_last() {
        struct NanHalf;
        impl Operator for NanHalf {
            type Decision = ();
            fn chromosome_length(&self) -> usize {
                1
            }
            fn decode(&self, _keys: &[f64]) {}
            fn evaluate(&self, keys: &[f64]) -> Vec<f64> {
                if keys[0] < 0.5 {
                    vec![f64::NAN, 0.0]
                } else {
                    vec![keys[0], 1.0 - keys[0]]
                }
            }
        }
        let cfg = config().with_max_generations(5);
        for ranking in [Ranking::Scalar, Ranking::Dominance(DominanceKind::Pareto)] {
            let result = GeneticRunner::run(&NanHalf, &cfg, ranking).unwrap();
            let best = result.best().unwrap();
            assert!(best.keys()[0] >= 0.5, "NaN individual ranked first under {ranking:?}");
        }
    }

    #[test]
    fn test_operator_stop() {
        struct StopAtThree;
        impl Operator for StopAtThree {
            type Decision = ();
            fn chromosome_length(&self) -> usize {
                2
            }
            fn decode(&self, _keys: &[f64]) {}
            fn evaluate(&self, keys: &[f64]) -> Vec<f64> {
                vec![keys[0]]
            }
            fn should_stop(&self, generation: usize, _population: &[Individual]) -> bool {
                generation >= 3
            }
        }
        let result = GeneticRunner::run(&StopAtThree, &config(), Ranking::Scalar).unwrap();
        assert_eq!(result.stop_reason, StopReason::Operator);
        assert_eq!(result.generations, 3);
    }

    #[test]
    fn test_warm_start_seeds_are_kept() {
        let seed = vec![vec![0.9; 8]];
        let cfg = config().with_max_generations(0);
        let result = GeneticRunner::run_seeded(&OneMax { n: 8 }, &cfg, Ranking::Scalar, seed).unwrap();
        assert_eq!(result.best().unwrap().keys(), &[0.9; 8]);
        assert_eq!(result.best().unwrap().scalar(), -8.0);
    }

    #[test]
    fn test_warm_start_leaves_room_for_seeds() {
        struct Seeded;
        impl Operator for Seeded {
            type Decision = ();
            fn chromosome_length(&self) -> usize {
                2
            }
            fn decode(&self, _keys: &[f64]) {}
            fn evaluate(&self, keys: &[f64]) -> Vec<f64> {
                vec![keys[0] + keys[1]]
            }
            fn seed_population<R: rand::Rng>(&self, _rng: &mut R) -> Vec<Vec<f64>> {
                vec![vec![0.25, 0.75], vec![0.5, 0.5]]
            }
        }
        let warm = vec![vec![0.9, 0.9]; 10];
        let cfg = config().with_population_size(10).with_max_generations(0);
        let result = GeneticRunner::run_seeded(&Seeded, &cfg, Ranking::Scalar, warm).unwrap();

        let keys: Vec<&[f64]> = result.population.iter().map(Individual::keys).collect();
        assert_eq!(keys.len(), 10);
        assert!(keys.contains(&&[0.25, 0.75][..]));
        assert!(keys.contains(&&[0.5, 0.5][..]));
        assert_eq!(keys.iter().filter(|k| **k == [0.9, 0.9]).count(), 8);
    }

    #[test]
    fn test_more_generations_never_worse() {
        let mut previous = f64::INFINITY;
        for generations in [0, 5, 10, 20, 40] {
            let cfg = config().with_population_size(20).with_max_generations(generations);
            let result = GeneticRunner::run(&OneMax { n: 30 }, &cfg, Ranking::Scalar).unwrap();
            let best = result.best().unwrap().scalar();
            assert!(best <= previous, "{generations} generations: {best} > {previous}");
            previous = best;
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_longer_run_extends_shorter(seed in 0u64..10_000, short in 0usize..15, extra in 1usize..15) {
            let base = config().with_population_size(16).with_seed(seed);
            let a = GeneticRunner::run(&OneMax { n: 12 }, &base.clone().with_max_generations(short), Ranking::Scalar).unwrap();
            let b = GeneticRunner::run(&OneMax { n: 12 }, &base.with_max_generations(short + extra), Ranking::Scalar).unwrap();
            // Same seed: the longer run replays the shorter one, then keeps its elites.
            prop_assert_eq!(&b.best_history[..a.best_history.len()], &a.best_history[..]);
            prop_assert!(b.best().unwrap().scalar() <= a.best().unwrap().scalar());
        }
    }

    #[test]
    fn test_multi_objective_front() {
        let cfg = config().with_population_size(30).with_max_generations(30);
        let result =
            GeneticRunner::run(&Schaffer, &cfg, Ranking::Dominance(DominanceKind::Pareto)).unwrap();
        assert!(result.front_size >= 2);
        for a in result.front() {
            for b in &result.population {
                assert!(
                    !crate::genetic::pareto_dominates(&b.objectives(), &a.objectives()),
                    "front member is dominated"
                );
            }
        }
    }

    #[test]
    fn test_time_limit() {
        struct Slow;
        impl Operator for Slow {
            type Decision = ();
            fn chromosome_length(&self) -> usize {
                1
            }
            fn decode(&self, _keys: &[f64]) {}
            fn evaluate(&self, keys: &[f64]) -> Vec<f64> {
                std::thread::sleep(std::time::Duration::from_millis(2));
                vec![keys[0]]
            }
        }
        let cfg = config()
            .with_population_size(10)
            .with_max_generations(10_000)
            .with_time_limit_ms(20);
        let result = GeneticRunner::run(&Slow, &cfg, Ranking::Scalar).unwrap();
        assert_eq!(result.stop_reason, StopReason::TimeLimit);
        assert!(!result.population.is_empty());
    }

    #[test]
    fn test_invalid_config_is_error() {
        let cfg = config().with_elite_fraction(0.9).with_mutant_fraction(0.5);
        assert!(GeneticRunner::run(&OneMax { n: 4 }, &cfg, Ranking::Scalar).is_err());
    }
}
