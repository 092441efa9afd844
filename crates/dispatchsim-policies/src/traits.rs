//! Dispatch policy trait definitions.
//!
//! All dispatch policies implement the [`DispatchPolicy`] trait, which
//! receives request information and server snapshots to make routing decisions.

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Read-only snapshot of a server's state, provided to dispatch policies.
///
/// This is the policies crate's view of a server. It contains only the
/// information needed for routing decisions, not the full simulation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSnapshot {
    pub id: u32,
    /// Requests waiting in the queue (excludes the one in service).
    pub queue_length: u32,
    /// Whether the worker is currently serving a request.
    pub busy: bool,
    /// Service speed multiplier.
    pub speed: f64,
    /// Total virtual time spent serving completed requests.
    pub cumulative_busy_time: f64,
    /// Exponential moving average of response times.
    pub smoothed_response_time: f64,
    /// Requests completed so far. Reported only; no built-in policy reads it.
    pub processed_count: u64,
}

impl ServerSnapshot {
    /// Queued requests plus the one in service, if any.
    pub fn outstanding(&self) -> u32 {
        self.queue_length + u32::from(self.busy)
    }
}

/// Virtual simulation clock interface for policies.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Decision returned by a dispatch policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Route to the server with this id.
    Route(u32),
    /// Reject the request (no server to route to).
    Reject,
}

/// Information about an incoming request, provided to dispatch policies.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub id: u64,
    pub arrival_time: f64,
    pub size: f64,
}

/// The core dispatch policy trait.
///
/// The simulator calls [`route`](DispatchPolicy::route) once per arrival with
/// server snapshots taken at that instant. Policies that need randomness draw
/// it from the `rng` passed in, never from ambient state, so runs stay
/// reproducible under a fixed seed.
pub trait DispatchPolicy: Send {
    fn route(
        &mut self,
        request: &RequestInfo,
        servers: &[ServerSnapshot],
        clock: &dyn Clock,
        rng: &mut dyn RngCore,
    ) -> RoutingDecision;

    /// Human-readable name for reports.
    fn name(&self) -> &str;
}

/// The first server minimizing `key`. Ties go to the earlier server.
pub fn argmin_by<F>(servers: &[ServerSnapshot], mut key: F) -> Option<&ServerSnapshot>
where
    F: FnMut(&ServerSnapshot) -> f64,
{
    servers
        .iter()
        .min_by(|a, b| key(a).total_cmp(&key(b)))
}
