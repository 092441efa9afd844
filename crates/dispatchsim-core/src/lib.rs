//! DispatchSim — Discrete-event simulator for load-balancer dispatch policies.
//!
//! This crate provides the simulation kernel (virtual clock and event
//! scheduler), the server and arrival process models, and the metrics
//! collector. Dispatch policies from `dispatchsim-policies` are plugged in to
//! pick a server for each arriving request.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────┐     ┌────────────┐     ┌──────────────┐
//! │  Poisson  │────▶│   Load     │     │   Metrics    │
//! │ Generator │     │  Balancer  │     │  Collection  │
//! └───────────┘     └─────┬──────┘     └──────▲───────┘
//!                         │                   │
//!           ┌─────────────┼─────────────┐     │
//!           ▼             ▼             ▼     │
//!     ┌──────────┐  ┌──────────┐  ┌──────────┐│
//!     │ Server 0 │  │ Server 1 │  │ Server N ├┘
//!     │  FIFO    │  │  FIFO    │  │  FIFO    │
//!     │  Worker  │  │  Worker  │  │  Worker  │
//!     └──────────┘  └──────────┘  └──────────┘
//!           ▲             ▲             ▲
//!           └─────── EventScheduler ────┘
//! ```

pub mod balancer;
pub mod clock;
pub mod config;
pub mod engine;
pub mod generator;
pub mod metrics;
pub mod request;
pub mod scheduler;
pub mod server;
pub mod sweep;

// Re-export key types for convenience.
pub use balancer::LoadBalancer;
pub use clock::SimClock;
pub use config::{ConfigError, SimConfig};
pub use dispatchsim_policies::PolicyKind;
pub use engine::{SimError, Simulation};
pub use generator::RequestGenerator;
pub use metrics::{MetricsCollector, SimulationMetrics, SimulationResult};
pub use request::{Request, RequestKind};
pub use scheduler::{EventScheduler, ProcessId, Resume, SchedulerError};
pub use server::{ServiceDistribution, ServiceModel, SimulatedServer};
pub use sweep::{compare_policies, linspace, sweep_arrival_rates, SweepPoint};

/// Run one simulation and return its headline triple.
///
/// `server_speeds` defaults to `1, 2, 4, ...` (2^i) when `None`.
pub fn run_simulation(
    policy: PolicyKind,
    arrival_rate: f64,
    horizon: f64,
    seed: u64,
    server_count: u32,
    server_speeds: Option<Vec<f64>>,
    smoothing_factor: f64,
) -> Result<SimulationResult, SimError> {
    let mut config = SimConfig::new(policy, arrival_rate, horizon, seed, server_count);
    config.cluster.speeds = server_speeds;
    config.cluster.smoothing_factor = smoothing_factor;

    let metrics = Simulation::new(config)?.run()?;
    Ok(metrics.result)
}
