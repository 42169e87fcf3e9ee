//! Response-time estimation.
//!
//! A replica is modelled as an M/M/1 server whose service rate is its
//! CPU allocation divided by the application's work size. Requests
//! already queued at the replica add their drain time.

use crate::model::{Application, EnvironmentInput, OptSolution, System};

/// Mean processing delay of a replica.
///
/// Returns `f64::INFINITY` when the replica cannot keep up with `load`.
pub fn processing_delay(app: &Application, cpu: f64, load: f64, queued: f64) -> f64 {
    let service_rate = cpu / app.work_size;
    if service_rate.is_nan() || service_rate <= 0.0 || load >= service_rate {
        return f64::INFINITY;
    }
    1.0 / (service_rate - load) + queued.max(0.0) / service_rate
}

/// Response time seen by requests from `src` if `dst` serves `load`
/// with `cpu` allocated.
///
/// Systems without a CPU resource have no processing delay.
pub fn estimate_response_time(
    system: &System,
    env: &EnvironmentInput,
    app: usize,
    src: usize,
    dst: usize,
    load: f64,
    cpu: f64,
) -> f64 {
    let net = env.delay(app, src, dst);
    match system.cpu_index() {
        Some(_) => net + processing_delay(&system.apps[app], cpu, load, env.queue_size[app][dst]),
        None => net,
    }
}

/// Response time under a complete decision.
pub fn response_time(
    system: &System,
    solution: &OptSolution,
    env: &EnvironmentInput,
    app: usize,
    src: usize,
    dst: usize,
) -> f64 {
    let cpu = system
        .cpu_index()
        .map_or(0.0, |r| solution.allocated[app][dst][r]);
    estimate_response_time(
        system,
        env,
        app,
        src,
        dst,
        solution.received_load[app][dst],
        cpu,
    )
}
