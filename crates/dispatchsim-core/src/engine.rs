//! Discrete-event simulation engine.
//!
//! A [`Simulation`] couples an [`EventScheduler`] with a [`Cluster`]: the
//! servers, the load balancer, the arrival process, the metrics collector and
//! the single seeded RNG all of them draw from. The scheduler resumes one
//! process at a time; the cluster implements [`Resume`] and dispatches the
//! resumption to the generator or to the worker it names.

use crate::balancer::LoadBalancer;
use crate::config::{ConfigError, SimConfig};
use crate::generator::RequestGenerator;
use crate::metrics::{MetricsCollector, SimulationMetrics, SimulationResult};
use crate::request::{Request, RequestKind};
use crate::scheduler::{EventScheduler, ProcessId, Resume, SchedulerError};
use crate::server::{ServiceModel, SimulatedServer};
use dispatchsim_policies::PolicyKind;
use log::{debug, trace};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("scheduler fault: {0}")]
    Scheduler(#[from] SchedulerError),
}

/// Everything the simulated processes act on.
pub struct Cluster {
    servers: Vec<SimulatedServer>,
    balancer: LoadBalancer,
    generator: RequestGenerator,
    service_model: ServiceModel,
    metrics: MetricsCollector,
    rng: ChaCha8Rng,
}

impl Cluster {
    /// Route an arrival and enqueue it. Returns the receiving server id, or
    /// `None` if the request was dropped.
    fn admit(&mut self, request: Request, scheduler: &mut EventScheduler) -> Option<u32> {
        self.metrics.record_arrival();

        let request_id = request.id;
        let Some(idx) = self
            .balancer
            .route(&request, &self.servers, scheduler.clock(), &mut self.rng)
        else {
            self.metrics.record_drop();
            return None;
        };

        let server = &mut self.servers[idx];
        if server.enqueue(request, scheduler) {
            Some(server.id)
        } else {
            trace!(
                "server {} queue full, dropped request {}",
                server.id,
                request_id
            );
            self.metrics.record_drop();
            None
        }
    }
}

impl Resume for Cluster {
    fn resume(
        &mut self,
        process: ProcessId,
        scheduler: &mut EventScheduler,
    ) -> Result<(), SchedulerError> {
        match process {
            ProcessId::Generator => {
                let request = self.generator.next_request(scheduler.now(), &mut self.rng);
                self.admit(request, scheduler);
                let gap = self.generator.next_gap(&mut self.rng);
                scheduler.schedule_after(ProcessId::Generator, gap)
            }
            ProcessId::Worker(id) => {
                let server = self
                    .servers
                    .get_mut(id as usize)
                    .ok_or(SchedulerError::UnknownProcess(process))?;
                if let Some(record) = server.resume(scheduler, &self.service_model, &mut self.rng)? {
                    self.metrics.record(record);
                }
                Ok(())
            }
        }
    }
}

/// A configured simulation run.
pub struct Simulation {
    name: String,
    horizon: f64,
    arrival_rate: f64,
    scheduler: EventScheduler,
    cluster: Cluster,
    started: bool,
}

impl Simulation {
    /// Build a simulation from a validated config.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let kind = config.policy_kind()?;

        let servers = config
            .server_speeds()
            .into_iter()
            .enumerate()
            .map(|(i, speed)| {
                SimulatedServer::new(
                    i as u32,
                    speed,
                    config.cluster.smoothing_factor,
                    config.cluster.queue_capacity,
                )
            })
            .collect();

        let generator = RequestGenerator::with_size_range(
            config.workload.arrival_rate,
            config.workload.min_size,
            config.workload.max_size,
        )
        .ok_or_else(|| {
            ConfigError::Validation(format!(
                "cannot build arrival process with rate {}",
                config.workload.arrival_rate
            ))
        })?;

        Ok(Self {
            name: config.simulation.name.clone(),
            horizon: config.simulation.horizon,
            arrival_rate: config.workload.arrival_rate,
            scheduler: EventScheduler::new(),
            cluster: Cluster {
                servers,
                balancer: LoadBalancer::new(kind),
                generator,
                service_model: config.service_model(),
                metrics: MetricsCollector::new(),
                rng: ChaCha8Rng::seed_from_u64(config.simulation.seed),
            },
            started: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> PolicyKind {
        self.cluster.balancer.kind()
    }

    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    /// Current virtual time.
    pub fn now(&self) -> f64 {
        self.scheduler.now()
    }

    pub fn servers(&self) -> &[SimulatedServer] {
        &self.cluster.servers
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.cluster.metrics
    }

    /// Total resumptions performed so far.
    pub fn resumptions(&self) -> u64 {
        self.scheduler.resumptions()
    }

    /// Inject an arrival at the current instant, bypassing the Poisson
    /// process. Returns the receiving server id, or `None` if dropped.
    pub fn dispatch(&mut self, kind: RequestKind, size: f64) -> Option<u32> {
        let request = self
            .cluster
            .generator
            .request_at(self.scheduler.now(), kind, size);
        self.cluster.admit(request, &mut self.scheduler)
    }

    /// Advance virtual time to `until`, starting the arrival process on the
    /// first call. Never runs past the horizon: metrics are normalised by it.
    pub fn run_until(&mut self, until: f64) -> Result<u64, SimError> {
        let until = until.min(self.horizon);
        if !self.started {
            let gap = self.cluster.generator.next_gap(&mut self.cluster.rng);
            self.scheduler.schedule_after(ProcessId::Generator, gap)?;
            self.started = true;
        }
        Ok(self.scheduler.run_until(until, &mut self.cluster)?)
    }

    /// Run to the horizon and aggregate the metrics.
    pub fn run(&mut self) -> Result<SimulationMetrics, SimError> {
        debug!(
            "starting '{}': policy={} rate={} horizon={} servers={}",
            self.name,
            self.policy(),
            self.arrival_rate,
            self.horizon,
            self.cluster.servers.len()
        );

        let resumed = self.run_until(self.horizon)?;
        let metrics = self.metrics();

        debug!(
            "finished '{}' after {} resumptions: throughput={:.4} mean_response={:.3} mean_util={:.3}",
            self.name,
            resumed,
            metrics.result.throughput,
            metrics.result.mean_response_time,
            metrics.result.mean_utilization
        );
        Ok(metrics)
    }

    /// Headline triple from the current server state.
    pub fn result(&self) -> SimulationResult {
        MetricsCollector::result(&self.cluster.servers, self.horizon)
    }

    /// Full report from the current server state.
    pub fn metrics(&self) -> SimulationMetrics {
        self.cluster.metrics.aggregate(
            self.policy().as_str(),
            self.arrival_rate,
            self.horizon,
            &self.cluster.servers,
        )
    }
}
