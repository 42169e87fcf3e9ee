//! Feasibility repair and invariant checks.

use crate::error::{PlacementError, Result};
use crate::model::{EnvironmentInput, OptSolution, System, EPSILON};

/// Allocation `app` would need at `node` after receiving `extra` more
/// load, or `None` if some resource would exceed the node's capacity.
pub(crate) fn fits(system: &System, sol: &OptSolution, app: usize, node: usize, extra: f64) -> Option<Vec<f64>> {
    let load = sol.received_load[app][node] + extra;
    let spec = &system.apps[app];
    let capacity = &system.nodes[node].capacity;
    let mut demand = Vec::with_capacity(system.nb_resources());
    for (r, &cap) in capacity.iter().enumerate() {
        let need = spec.demand_of(r, load);
        if sol.used_by_others(app, node, r) + need > cap {
            return None;
        }
        demand.push(need);
    }
    Some(demand)
}

/// Routes `fraction` of a source's `load` to `node` with a precomputed
/// allocation.
pub(crate) fn assign(sol: &mut OptSolution, app: usize, src: usize, node: usize, fraction: f64, load: f64, allocation: Vec<f64>) {
    sol.placement[app][node] = true;
    sol.received_load[app][node] += fraction * load;
    sol.allocated[app][node] = allocation;
    sol.load_distribution[app][src][node] += fraction;
}

/// Recomputes a replica's allocation from its received load. No
/// capacity check: meant for the cloud, whose capacity is unbounded.
fn reallocate(system: &System, sol: &mut OptSolution, app: usize, node: usize) {
    let load = sol.received_load[app][node];
    sol.allocated[app][node] = (0..system.nb_resources())
        .map(|r| system.apps[app].demand_of(r, load))
        .collect();
}

/// Restores the decision invariants in place.
///
/// Per application:
///
/// 1. an application without any replica is placed on the cloud;
/// 2. while more than `max_instances` replicas run, the least-loaded
///    edge replica is evicted and its routing moved to the cloud;
/// 3. routing to nodes without a replica is withdrawn, and any source
///    whose fractions do not sum to 1 sends the remainder to the cloud
///    when it hosts a replica, otherwise to the nearest replica that can
///    absorb it, otherwise to the cloud;
/// 4. step 2 runs again if step 3 added the cloud.
///
/// Sources with no load are routed entirely to their nearest replica.
/// A solution that already satisfies every invariant is left unchanged.
pub fn make_solution_feasible(system: &System, env: &EnvironmentInput, sol: &mut OptSolution) {
    for app in 0..system.nb_apps() {
        if sol.nb_instances(app) == 0 {
            let cloud = system.cloud_index();
            sol.placement[app][cloud] = true;
            reallocate(system, sol, app, cloud);
        }
        enforce_instance_limit(system, sol, app);
        complete_dispatch(system, env, sol, app);
        enforce_instance_limit(system, sol, app);
    }
}

fn enforce_instance_limit(system: &System, sol: &mut OptSolution, app: usize) {
    let cloud = system.cloud_index();
    let max = system.apps[app].max_instances;
    while sol.nb_instances(app) > max {
        let Some(victim) = sol
            .hosts(app)
            .into_iter()
            .filter(|&n| n != cloud)
            .min_by(|&a, &b| sol.received_load[app][a].total_cmp(&sol.received_load[app][b]))
        else {
            break;
        };
        let moved = sol.received_load[app][victim];
        for src in 0..sol.nb_nodes() {
            let f = std::mem::take(&mut sol.load_distribution[app][src][victim]);
            sol.load_distribution[app][src][cloud] += f;
        }
        sol.unplace(app, victim);
        sol.placement[app][cloud] = true;
        sol.received_load[app][cloud] += moved;
        reallocate(system, sol, app, cloud);
    }
}

fn complete_dispatch(system: &System, env: &EnvironmentInput, sol: &mut OptSolution, app: usize) {
    let cloud = system.cloud_index();
    for src in 0..sol.nb_nodes() {
        for dst in 0..sol.nb_nodes() {
            if !sol.placement[app][dst] {
                sol.load_distribution[app][src][dst] = 0.0;
            }
        }
        let remainder = 1.0 - sol.dispatched(app, src);
        if remainder.abs() <= EPSILON {
            continue;
        }
        let load = env.generated_load[app][src];

        if load <= 0.0 {
            let nearest = nearest_hosts(env, sol, app, src).first().copied().unwrap_or(cloud);
            for f in &mut sol.load_distribution[app][src] {
                *f = 0.0;
            }
            sol.load_distribution[app][src][nearest] = 1.0;
            continue;
        }

        if remainder < 0.0 {
            shrink_dispatch(system, env, sol, app, src);
            continue;
        }

        let extra = remainder * load;
        let target = if sol.placement[app][cloud] {
            Some((cloud, fits(system, sol, app, cloud, extra)))
        } else {
            nearest_hosts(env, sol, app, src)
                .into_iter()
                .find_map(|n| fits(system, sol, app, n, extra).map(|alloc| (n, Some(alloc))))
        };
        match target {
            Some((node, Some(alloc))) => assign(sol, app, src, node, remainder, load, alloc),
            _ => {
                sol.placement[app][cloud] = true;
                sol.received_load[app][cloud] += extra;
                sol.load_distribution[app][src][cloud] += remainder;
                reallocate(system, sol, app, cloud);
            }
        }
    }
}

/// Scales an over-dispatched source back to a total of 1, releasing
/// the excess load from every destination.
fn shrink_dispatch(system: &System, env: &EnvironmentInput, sol: &mut OptSolution, app: usize, src: usize) {
    let load = env.generated_load[app][src];
    let total = sol.dispatched(app, src);
    for dst in 0..sol.nb_nodes() {
        let f = sol.load_distribution[app][src][dst];
        if f <= 0.0 {
            continue;
        }
        let scaled = f / total;
        sol.load_distribution[app][src][dst] = scaled;
        sol.received_load[app][dst] = (sol.received_load[app][dst] - (f - scaled) * load).max(0.0);
        reallocate(system, sol, app, dst);
    }
}

/// Replicas of `app` ordered by network delay from `src`.
fn nearest_hosts(env: &EnvironmentInput, sol: &OptSolution, app: usize, src: usize) -> Vec<usize> {
    let mut hosts = sol.hosts(app);
    hosts.sort_by(|&a, &b| env.delay(app, src, a).total_cmp(&env.delay(app, src, b)));
    hosts
}

/// Checks every decision invariant.
///
/// - shapes match the system;
/// - each application runs between 1 and `max_instances` replicas;
/// - nodes without a replica carry no allocation, load, or routing;
/// - every source's routing fractions sum to 1 within [`EPSILON`];
/// - no node's allocation exceeds its capacity by more than [`EPSILON`].
pub fn validate_solution(system: &System, sol: &OptSolution) -> Result<()> {
    let (apps, nodes, res) = (system.nb_apps(), system.nb_nodes(), system.nb_resources());
    let invalid = |app: usize, reason: String| Err(PlacementError::InvalidSolution { app, reason });

    if sol.nb_apps() != apps
        || sol.allocated.len() != apps
        || sol.received_load.len() != apps
        || sol.load_distribution.len() != apps
    {
        return invalid(0, format!("expected {apps} applications"));
    }
    for app in 0..apps {
        let shaped = sol.placement[app].len() == nodes
            && sol.received_load[app].len() == nodes
            && sol.allocated[app].len() == nodes
            && sol.allocated[app].iter().all(|a| a.len() == res)
            && sol.load_distribution[app].len() == nodes
            && sol.load_distribution[app].iter().all(|row| row.len() == nodes);
        if !shaped {
            return invalid(app, format!("expected {nodes} nodes and {res} resources"));
        }

        let instances = sol.nb_instances(app);
        let max = system.apps[app].max_instances;
        if instances == 0 || instances > max {
            return invalid(app, format!("{instances} replicas, allowed 1..={max}"));
        }

        for node in 0..nodes {
            if sol.placement[app][node] {
                continue;
            }
            if sol.allocated[app][node].iter().any(|&a| a > EPSILON) || sol.received_load[app][node] > EPSILON {
                return invalid(app, format!("allocation on node {node} without a replica"));
            }
        }

        for src in 0..nodes {
            let row = &sol.load_distribution[app][src];
            if row.iter().any(|f| f.is_nan() || *f < -EPSILON) {
                return invalid(app, format!("malformed routing from node {src}"));
            }
            if let Some(dst) = (0..nodes).find(|&d| row[d] > EPSILON && !sol.placement[app][d]) {
                return invalid(app, format!("node {src} routes to node {dst} without a replica"));
            }
            let total: f64 = row.iter().sum();
            if (total - 1.0).abs() > EPSILON {
                return invalid(app, format!("node {src} dispatches {total} of its load"));
            }
        }
    }

    for node in 0..nodes {
        for r in 0..res {
            let used = sol.used(node, r);
            let cap = system.nodes[node].capacity[r];
            if used.is_nan() || used > cap + EPSILON {
                let app = (0..apps).find(|&a| sol.allocated[a][node][r] > 0.0).unwrap_or(0);
                return invalid(app, format!("node {node} resource {r} uses {used} of {cap}"));
            }
        }
    }
    Ok(())
}

/// Whether `sol` satisfies every invariant checked by [`validate_solution`].
pub fn is_solution_valid(system: &System, sol: &OptSolution) -> bool {
    validate_solution(system, sol).is_ok()
}
