//! TOML configuration parsing for DispatchSim.
//!
//! Defines the complete configuration schema for simulation runs: run
//! parameters (seed, horizon, policy), cluster shape (server count, speeds,
//! queue capacity, EMA smoothing) and workload (arrival rate, service model).

use crate::generator::DEFAULT_SIZE_RANGE;
use crate::server::{ServiceDistribution, ServiceModel};
use dispatchsim_policies::{PolicyKind, UnknownPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Validation(String),
    #[error("Unknown dispatch policy: {0}")]
    UnknownPolicy(String),
}

impl From<UnknownPolicy> for ConfigError {
    fn from(e: UnknownPolicy) -> Self {
        ConfigError::UnknownPolicy(e.0)
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub simulation: SimulationSection,
    #[serde(default)]
    pub cluster: ClusterSection,
    #[serde(default)]
    pub workload: WorkloadSection,
}

/// General simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSection {
    /// Human-readable name for this simulation.
    #[serde(default = "default_sim_name")]
    pub name: String,
    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Virtual-time length of the run.
    #[serde(default = "default_horizon")]
    pub horizon: f64,
    /// Dispatch policy name.
    #[serde(default = "default_policy")]
    pub policy: String,
}

fn default_sim_name() -> String {
    "simulation".to_string()
}
fn default_seed() -> u64 {
    42
}
fn default_horizon() -> f64 {
    2000.0
}
fn default_policy() -> String {
    "random".to_string()
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            name: default_sim_name(),
            seed: default_seed(),
            horizon: default_horizon(),
            policy: default_policy(),
        }
    }
}

/// Cluster configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSection {
    /// Number of servers.
    #[serde(default = "default_num_servers")]
    pub num_servers: u32,
    /// Per-server speed multipliers. Defaults to 1, 2, 4, ... (2^i).
    #[serde(default)]
    pub speeds: Option<Vec<f64>>,
    /// Maximum queue length per server. Unbounded when absent.
    #[serde(default)]
    pub queue_capacity: Option<usize>,
    /// EMA weight of the newest response time sample.
    #[serde(default = "default_smoothing_factor")]
    pub smoothing_factor: f64,
}

fn default_num_servers() -> u32 {
    3
}
fn default_smoothing_factor() -> f64 {
    0.2
}

impl Default for ClusterSection {
    fn default() -> Self {
        Self {
            num_servers: default_num_servers(),
            speeds: None,
            queue_capacity: None,
            smoothing_factor: default_smoothing_factor(),
        }
    }
}

/// Workload and service model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSection {
    /// Poisson arrival rate (requests per time unit).
    #[serde(default = "default_arrival_rate")]
    pub arrival_rate: f64,
    /// Mean service time of a unit-size compute request. Exponential model
    /// only; `uniform` uses its fixed ranges.
    #[serde(default = "default_compute_mean")]
    pub compute_mean: f64,
    /// Mean service time of a unit-size io request. Exponential model only.
    #[serde(default = "default_io_mean")]
    pub io_mean: f64,
    #[serde(default = "default_min_size")]
    pub min_size: f64,
    #[serde(default = "default_max_size")]
    pub max_size: f64,
    #[serde(default)]
    pub service_distribution: ServiceDistribution,
}

fn default_arrival_rate() -> f64 {
    0.5
}
fn default_compute_mean() -> f64 {
    2.0
}
fn default_io_mean() -> f64 {
    4.0
}
fn default_min_size() -> f64 {
    DEFAULT_SIZE_RANGE.0
}
fn default_max_size() -> f64 {
    DEFAULT_SIZE_RANGE.1
}

impl Default for WorkloadSection {
    fn default() -> Self {
        Self {
            arrival_rate: default_arrival_rate(),
            compute_mean: default_compute_mean(),
            io_mean: default_io_mean(),
            min_size: default_min_size(),
            max_size: default_max_size(),
            service_distribution: ServiceDistribution::default(),
        }
    }
}

/// Largest cluster whose default 2^i speeds are all finite.
const MAX_DEFAULT_SPEED_SERVERS: u32 = 1024;

fn positive_finite(value: f64) -> bool {
    value > 0.0 && value.is_finite()
}

impl SimConfig {
    /// Build a config from the core run parameters, defaults elsewhere.
    ///
    /// The result is not validated; [`Simulation::new`](crate::Simulation::new)
    /// validates before anything runs.
    pub fn new(
        policy: PolicyKind,
        arrival_rate: f64,
        horizon: f64,
        seed: u64,
        num_servers: u32,
    ) -> Self {
        let mut config = Self::default();
        config.simulation.policy = policy.as_str().to_string();
        config.simulation.horizon = horizon;
        config.simulation.seed = seed;
        config.cluster.num_servers = num_servers;
        config.workload.arrival_rate = arrival_rate;
        config
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.policy_kind()?;

        if !positive_finite(self.simulation.horizon) {
            return Err(ConfigError::Validation(format!(
                "horizon must be > 0, got {}",
                self.simulation.horizon
            )));
        }
        if self.cluster.num_servers == 0 {
            return Err(ConfigError::Validation(
                "num_servers must be >= 1".to_string(),
            ));
        }
        match &self.cluster.speeds {
            Some(speeds) => {
                if speeds.len() != self.cluster.num_servers as usize {
                    return Err(ConfigError::Validation(format!(
                        "speeds has {} entries but num_servers is {}",
                        speeds.len(),
                        self.cluster.num_servers,
                    )));
                }
                if let Some(bad) = speeds.iter().find(|s| !positive_finite(**s)) {
                    return Err(ConfigError::Validation(format!(
                        "server speeds must be > 0, got {}",
                        bad
                    )));
                }
            }
            None if self.cluster.num_servers > MAX_DEFAULT_SPEED_SERVERS => {
                return Err(ConfigError::Validation(format!(
                    "default 2^i speeds overflow beyond {} servers, got {}; set speeds explicitly",
                    MAX_DEFAULT_SPEED_SERVERS, self.cluster.num_servers
                )));
            }
            None => {}
        }
        if self.cluster.queue_capacity == Some(0) {
            return Err(ConfigError::Validation(
                "queue_capacity must be > 0 when set".to_string(),
            ));
        }
        let alpha = self.cluster.smoothing_factor;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "smoothing_factor must be in (0, 1], got {}",
                alpha
            )));
        }
        if !positive_finite(self.workload.arrival_rate) {
            return Err(ConfigError::Validation(format!(
                "arrival_rate must be > 0, got {}",
                self.workload.arrival_rate
            )));
        }
        if !positive_finite(self.workload.compute_mean) || !positive_finite(self.workload.io_mean)
        {
            return Err(ConfigError::Validation(
                "compute_mean and io_mean must be > 0".to_string(),
            ));
        }
        if !positive_finite(self.workload.min_size)
            || !self.workload.max_size.is_finite()
            || self.workload.max_size < self.workload.min_size
        {
            return Err(ConfigError::Validation(format!(
                "request size range [{}, {}] is invalid",
                self.workload.min_size, self.workload.max_size
            )));
        }
        Ok(())
    }

    /// Parse the policy name.
    pub fn policy_kind(&self) -> Result<PolicyKind, ConfigError> {
        Ok(self.simulation.policy.parse::<PolicyKind>()?)
    }

    /// Speed multiplier of every server, defaulting to 2^i.
    pub fn server_speeds(&self) -> Vec<f64> {
        match &self.cluster.speeds {
            Some(speeds) => speeds.clone(),
            None => (0..self.cluster.num_servers)
                .map(|i| 2f64.powi(i as i32))
                .collect(),
        }
    }

    /// Service model for all servers.
    pub fn service_model(&self) -> ServiceModel {
        ServiceModel {
            compute_mean: self.workload.compute_mean,
            io_mean: self.workload.io_mean,
            distribution: self.workload.service_distribution,
        }
    }
}
