//! Policy comparison and arrival-rate sweeps.
//!
//! Every run is a fresh [`Simulation`] built from the same config with only
//! the policy (and, for sweeps, the arrival rate) replaced, so each run starts
//! from the config's seed.

use crate::config::SimConfig;
use crate::engine::{SimError, Simulation};
use crate::metrics::{SimulationMetrics, SimulationResult};
use dispatchsim_policies::PolicyKind;
use log::debug;
use serde::{Deserialize, Serialize};

/// One (policy, rate) cell of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub policy: PolicyKind,
    pub arrival_rate: f64,
    pub result: SimulationResult,
}

fn with_policy(config: &SimConfig, policy: PolicyKind) -> SimConfig {
    let mut config = config.clone();
    config.simulation.policy = policy.as_str().to_string();
    config
}

/// Run every policy against the same config.
pub fn compare_policies(
    config: &SimConfig,
    policies: &[PolicyKind],
) -> Result<Vec<SimulationMetrics>, SimError> {
    policies
        .iter()
        .map(|&policy| Simulation::new(with_policy(config, policy))?.run())
        .collect()
}

/// Run every policy at every arrival rate.
pub fn sweep_arrival_rates(
    config: &SimConfig,
    policies: &[PolicyKind],
    rates: &[f64],
) -> Result<Vec<SweepPoint>, SimError> {
    let mut points = Vec::with_capacity(policies.len() * rates.len());
    for &policy in policies {
        debug!("sweeping {} over {} rates", policy, rates.len());
        for &rate in rates {
            let mut run_config = with_policy(config, policy);
            run_config.workload.arrival_rate = rate;
            let metrics = Simulation::new(run_config)?.run()?;
            points.push(SweepPoint {
                policy,
                arrival_rate: rate,
                result: metrics.result,
            });
        }
    }
    Ok(points)
}

/// `steps` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (steps - 1) as f64;
            (0..steps)
                .map(|i| if i == steps - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Format sweep points as a table grouped by policy.
pub fn format_sweep_table(points: &[SweepPoint]) -> String {
    if points.is_empty() {
        return String::from("No sweep points.\n");
    }

    let mut out = String::new();
    out.push_str(&format!("\n{:=<72}\n", "  Arrival Rate Sweep  "));
    out.push_str(&format!(
        "{:<22} {:>10} {:>12} {:>12} {:>12}\n",
        "Policy", "Rate", "Thruput", "Resp mean", "Util"
    ));
    out.push_str(&format!("{:-<72}\n", ""));

    let mut last: Option<PolicyKind> = None;
    for p in points {
        if last.is_some_and(|prev| prev != p.policy) {
            out.push('\n');
        }
        last = Some(p.policy);
        out.push_str(&format!(
            "{:<22} {:>10.3} {:>12.4} {:>12.3} {:>12.3}\n",
            p.policy.as_str(),
            p.arrival_rate,
            p.result.throughput,
            p.result.mean_response_time,
            p.result.mean_utilization,
        ));
    }
    out.push_str(&format!("{:=<72}\n", ""));
    out
}
