//! Simulated server with a FIFO queue and a single worker process.
//!
//! Each [`SimulatedServer`] owns its queue and counters. The worker loop is a
//! state machine driven by the [`EventScheduler`]: it blocks while the queue
//! is empty, is woken by [`SimulatedServer::enqueue`], serves the oldest
//! request for a sampled service time, records the completion and moves on to
//! the next request.

use crate::metrics::CompletionRecord;
use crate::request::{Request, RequestKind};
use crate::scheduler::{EventScheduler, ProcessId, SchedulerError};
use dispatchsim_policies::ServerSnapshot;
use log::trace;
use rand::Rng;
use rand_distr::Exp1;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Shape of the service-time distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceDistribution {
    /// Exponential with the kind's mean, scaled by size.
    #[default]
    Exponential,
    /// Fixed uniform ranges per kind (compute 2–5, io 4–8), scaled by size.
    /// `compute_mean` and `io_mean` are not used.
    Uniform,
}

/// Service-time model shared by all servers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceModel {
    /// Mean service time of a unit-size compute request.
    pub compute_mean: f64,
    /// Mean service time of a unit-size io request.
    pub io_mean: f64,
    pub distribution: ServiceDistribution,
}

impl ServiceModel {
    /// Mean service time for `kind` at unit size and unit speed.
    pub fn mean_for(&self, kind: RequestKind) -> f64 {
        match kind {
            RequestKind::Compute => self.compute_mean,
            RequestKind::Io => self.io_mean,
        }
    }

    /// Draw a service time for `request` on a server running at `speed`.
    pub fn sample<R: Rng + ?Sized>(&self, request: &Request, speed: f64, rng: &mut R) -> f64 {
        let base = match self.distribution {
            ServiceDistribution::Exponential => {
                let unit: f64 = rng.sample(Exp1);
                unit * self.mean_for(request.kind)
            }
            ServiceDistribution::Uniform => match request.kind {
                RequestKind::Compute => rng.gen_range(2.0..=5.0),
                RequestKind::Io => rng.gen_range(4.0..=8.0),
            },
        };
        base * request.size / speed
    }
}

impl Default for ServiceModel {
    fn default() -> Self {
        Self {
            compute_mean: 2.0,
            io_mean: 4.0,
            distribution: ServiceDistribution::Exponential,
        }
    }
}

/// Where the worker process currently sits in its loop.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerState {
    /// Blocked on an empty queue. No resumption is pending.
    Blocked,
    /// Woken by an enqueue; a zero-delay resumption is pending.
    Woken,
    /// Serving a request; resumes when the service time has elapsed.
    Serving {
        request: Request,
        started_at: f64,
        service_time: f64,
    },
}

/// A simulated server that processes requests one at a time.
#[derive(Debug, Clone)]
pub struct SimulatedServer {
    /// Unique server identifier (its index in the cluster).
    pub id: u32,
    /// Pending request queue. Does not include the request in service.
    pub queue: VecDeque<Request>,
    /// Maximum queue length; `None` means unbounded.
    pub capacity: Option<usize>,
    /// Service speed multiplier.
    pub speed: f64,
    /// Whether a request is in service.
    pub busy: bool,
    /// EMA weight of the newest response time sample.
    pub smoothing_factor: f64,
    worker: WorkerState,
    // --- Counters ---
    /// Requests whose service completed.
    pub processed_count: u64,
    /// Requests accepted into the queue.
    pub received_count: u64,
    /// Sum of service times of completed requests.
    pub cumulative_busy_time: f64,
    /// Response time of every completed request, in completion order.
    pub response_time_samples: Vec<f64>,
    /// Exponential moving average of response times.
    pub smoothed_response_time: f64,
}

impl SimulatedServer {
    /// Create an idle server with an empty queue.
    pub fn new(id: u32, speed: f64, smoothing_factor: f64, capacity: Option<usize>) -> Self {
        Self {
            id,
            queue: VecDeque::new(),
            capacity,
            speed,
            busy: false,
            smoothing_factor,
            worker: WorkerState::Blocked,
            processed_count: 0,
            received_count: 0,
            cumulative_busy_time: 0.0,
            response_time_samples: Vec::new(),
            smoothed_response_time: 0.0,
        }
    }

    pub fn process_id(&self) -> ProcessId {
        ProcessId::Worker(self.id)
    }

    pub fn worker_state(&self) -> &WorkerState {
        &self.worker
    }

    /// Whether the queue has room for another request.
    pub fn can_accept(&self) -> bool {
        self.capacity.map_or(true, |cap| self.queue.len() < cap)
    }

    /// Enqueue a request. Returns false if the queue is full.
    ///
    /// If the worker is blocked on the empty queue it becomes eligible to
    /// resume at the current instant.
    pub fn enqueue(&mut self, request: Request, scheduler: &mut EventScheduler) -> bool {
        if !self.can_accept() {
            return false;
        }
        self.queue.push_back(request);
        self.received_count += 1;

        if self.worker == WorkerState::Blocked {
            self.worker = WorkerState::Woken;
            scheduler.wake(self.process_id());
        }
        true
    }

    /// Resume the worker process.
    ///
    /// Finishes the request in service (if any), then either starts the next
    /// queued request or blocks on the empty queue.
    pub fn resume<R: Rng + ?Sized>(
        &mut self,
        scheduler: &mut EventScheduler,
        model: &ServiceModel,
        rng: &mut R,
    ) -> Result<Option<CompletionRecord>, SchedulerError> {
        let now = scheduler.now();
        let completion = match std::mem::replace(&mut self.worker, WorkerState::Blocked) {
            WorkerState::Serving {
                request,
                started_at,
                service_time,
            } => Some(self.complete(request, started_at, service_time, now)),
            WorkerState::Woken | WorkerState::Blocked => None,
        };

        self.start_next(scheduler, model, rng)?;
        Ok(completion)
    }

    fn start_next<R: Rng + ?Sized>(
        &mut self,
        scheduler: &mut EventScheduler,
        model: &ServiceModel,
        rng: &mut R,
    ) -> Result<(), SchedulerError> {
        let Some(request) = self.queue.pop_front() else {
            self.busy = false;
            self.worker = WorkerState::Blocked;
            return Ok(());
        };

        let service_time = model.sample(&request, self.speed, rng);
        self.busy = true;
        scheduler.schedule_after(self.process_id(), service_time)?;
        self.worker = WorkerState::Serving {
            request,
            started_at: scheduler.now(),
            service_time,
        };
        Ok(())
    }

    fn complete(
        &mut self,
        request: Request,
        started_at: f64,
        service_time: f64,
        now: f64,
    ) -> CompletionRecord {
        let response_time = request.response_time(now);
        self.response_time_samples.push(response_time);
        self.processed_count += 1;
        self.cumulative_busy_time += service_time;
        self.smoothed_response_time = self.smoothing_factor * response_time
            + (1.0 - self.smoothing_factor) * self.smoothed_response_time;
        self.busy = false;

        trace!(
            "server {} completed request {} at {:.3} (response {:.3})",
            self.id,
            request.id,
            now,
            response_time
        );

        CompletionRecord {
            request_id: request.id,
            server_id: self.id,
            kind: request.kind,
            arrival_time: request.arrival_time,
            start_time: started_at,
            completion_time: now,
            service_time,
        }
    }

    /// Current queue length.
    pub fn queue_length(&self) -> usize {
        self.queue.len()
    }

    /// Requests accepted but not yet completed.
    pub fn in_flight(&self) -> u64 {
        self.queue.len() as u64 + u64::from(self.busy)
    }

    /// Fraction of `horizon` spent serving completed requests.
    pub fn utilization(&self, horizon: f64) -> f64 {
        if horizon <= 0.0 {
            return 0.0;
        }
        self.cumulative_busy_time / horizon
    }

    /// Take a read-only snapshot for dispatch policies.
    pub fn snapshot(&self) -> ServerSnapshot {
        ServerSnapshot {
            id: self.id,
            queue_length: self.queue.len() as u32,
            busy: self.busy,
            speed: self.speed,
            cumulative_busy_time: self.cumulative_busy_time,
            smoothed_response_time: self.smoothed_response_time,
            processed_count: self.processed_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Resume;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn req(id: u64, arrival_time: f64) -> Request {
        Request::new(id, arrival_time, RequestKind::Compute, 1.0)
    }

    /// Single-server world so the worker can be driven by the scheduler.
    struct OneServer {
        server: SimulatedServer,
        model: ServiceModel,
        rng: ChaCha8Rng,
        completions: Vec<CompletionRecord>,
    }

    impl OneServer {
        fn new(capacity: Option<usize>) -> Self {
            Self {
                server: SimulatedServer::new(0, 1.0, 0.5, capacity),
                model: ServiceModel::default(),
                rng: ChaCha8Rng::seed_from_u64(7),
                completions: Vec::new(),
            }
        }
    }

    impl Resume for OneServer {
        fn resume(
            &mut self,
            _process: ProcessId,
            scheduler: &mut EventScheduler,
        ) -> Result<(), SchedulerError> {
            if let Some(done) = self.server.resume(scheduler, &self.model, &mut self.rng)? {
                self.completions.push(done);
            }
            Ok(())
        }
    }

    #[test]
    fn test_new_server_is_idle_and_blocked() {
        let server = SimulatedServer::new(3, 2.0, 0.1, None);
        assert!(!server.busy);
        assert_eq!(server.queue_length(), 0);
        assert_eq!(server.worker_state(), &WorkerState::Blocked);
        assert_eq!(server.snapshot().id, 3);
    }

    #[test]
    fn test_enqueue_wakes_blocked_worker_once() {
        let mut sched = EventScheduler::new();
        let mut server = SimulatedServer::new(0, 1.0, 0.5, None);
        assert!(server.enqueue(req(0, 0.0), &mut sched));
        assert!(server.enqueue(req(1, 0.0), &mut sched));
        assert_eq!(server.worker_state(), &WorkerState::Woken);
        assert_eq!(sched.pending(), 1);
        assert_eq!(server.received_count, 2);
    }

    #[test]
    fn test_bounded_queue_rejects_when_full() {
        let mut sched = EventScheduler::new();
        let mut server = SimulatedServer::new(0, 1.0, 0.5, Some(2));
        assert!(server.enqueue(req(0, 0.0), &mut sched));
        assert!(server.enqueue(req(1, 0.0), &mut sched));
        assert!(!server.enqueue(req(2, 0.0), &mut sched));
        assert_eq!(server.queue_length(), 2);
        assert_eq!(server.received_count, 2);
    }

    #[test]
    fn test_worker_serves_fifo_and_keeps_counters_consistent() {
        let mut sched = EventScheduler::new();
        let mut world = OneServer::new(None);
        for i in 0..5 {
            world.server.enqueue(req(i, 0.0), &mut sched);
        }
        sched.run_until(1_000.0, &mut world).unwrap();

        let ids: Vec<_> = world.completions.iter().map(|c| c.request_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(world.server.processed_count, 5);
        assert_eq!(world.server.response_time_samples.len(), 5);
        assert!(!world.server.busy);
        assert_eq!(world.server.worker_state(), &WorkerState::Blocked);

        // Back-to-back service: each start is the previous completion.
        for pair in world.completions.windows(2) {
            assert_eq!(pair[1].start_time, pair[0].completion_time);
        }
        let busy: f64 = world.completions.iter().map(|c| c.service_time).sum();
        assert!((world.server.cumulative_busy_time - busy).abs() < 1e-9);
    }

    #[test]
    fn test_ema_update() {
        let mut server = SimulatedServer::new(0, 1.0, 0.5, None);
        server.complete(req(0, 0.0), 0.0, 4.0, 4.0);
        assert_eq!(server.smoothed_response_time, 2.0);
        server.complete(req(1, 2.0), 4.0, 4.0, 8.0);
        // 0.5 * 6 + 0.5 * 2
        assert_eq!(server.smoothed_response_time, 4.0);
    }

    #[test]
    fn test_ema_with_alpha_one_tracks_last_sample() {
        let mut server = SimulatedServer::new(0, 1.0, 1.0, None);
        server.complete(req(0, 0.0), 0.0, 3.0, 3.0);
        server.complete(req(1, 1.0), 3.0, 8.0, 11.0);
        assert_eq!(server.smoothed_response_time, 10.0);
    }

    #[test]
    fn test_busy_while_serving() {
        let mut sched = EventScheduler::new();
        let mut world = OneServer::new(None);
        world.server.enqueue(req(0, 0.0), &mut sched);
        world.server.enqueue(req(1, 0.0), &mut sched);
        // Resume only the wake-up at t = 0.
        sched.run_until(0.0, &mut world).unwrap();
        assert!(world.server.busy);
        assert_eq!(world.server.queue_length(), 1);
        assert_eq!(world.server.in_flight(), 2);
        assert!(matches!(
            world.server.worker_state(),
            WorkerState::Serving { request, .. } if request.id == 0
        ));
    }

    #[test]
    fn test_service_time_scales_with_size_and_speed() {
        let model = ServiceModel::default();
        let small = Request::new(0, 0.0, RequestKind::Io, 1.0);
        let large = Request::new(0, 0.0, RequestKind::Io, 4.0);

        let mut a = ChaCha8Rng::seed_from_u64(1);
        let mut b = ChaCha8Rng::seed_from_u64(1);
        let t_small = model.sample(&small, 1.0, &mut a);
        let t_large_fast = model.sample(&large, 2.0, &mut b);
        assert!((t_large_fast - 2.0 * t_small).abs() < 1e-9);
    }

    #[test]
    fn test_exponential_mean_per_kind() {
        let model = ServiceModel::default();
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let n = 20_000;
        for (kind, expected) in [(RequestKind::Compute, 2.0), (RequestKind::Io, 4.0)] {
            let r = Request::new(0, 0.0, kind, 1.0);
            let mean: f64 = (0..n).map(|_| model.sample(&r, 1.0, &mut rng)).sum::<f64>() / n as f64;
            assert!(
                (mean - expected).abs() < expected * 0.05,
                "{:?} mean {} far from {}",
                kind,
                mean,
                expected
            );
        }
    }

    #[test]
    fn test_uniform_distribution_bounds() {
        let model = ServiceModel {
            distribution: ServiceDistribution::Uniform,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let r = Request::new(0, 0.0, RequestKind::Io, 1.0);
        for _ in 0..500 {
            let t = model.sample(&r, 1.0, &mut rng);
            assert!((4.0..=8.0).contains(&t));
        }
    }

    #[test]
    fn test_uniform_ignores_configured_means() {
        let model = ServiceModel {
            compute_mean: 100.0,
            io_mean: 100.0,
            distribution: ServiceDistribution::Uniform,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let r = Request::new(0, 0.0, RequestKind::Compute, 1.0);
        for _ in 0..500 {
            let t = model.sample(&r, 1.0, &mut rng);
            assert!((2.0..=5.0).contains(&t), "sample {} outside [2, 5]", t);
        }
    }

    #[test]
    fn test_snapshot_reports_processed_count() {
        let mut server = SimulatedServer::new(1, 2.0, 0.5, None);
        server.complete(req(0, 0.0), 0.0, 1.0, 1.0);
        server.complete(req(1, 0.0), 1.0, 1.0, 2.0);
        let snap = server.snapshot();
        assert_eq!(snap.processed_count, 2);
        assert_eq!(snap.cumulative_busy_time, 2.0);
    }

    #[test]
    fn test_utilization() {
        let mut server = SimulatedServer::new(0, 1.0, 0.5, None);
        server.cumulative_busy_time = 250.0;
        assert_eq!(server.utilization(1000.0), 0.25);
        assert_eq!(server.utilization(0.0), 0.0);
    }
}
