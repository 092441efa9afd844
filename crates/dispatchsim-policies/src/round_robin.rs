//! Round-robin dispatch policy.
//!
//! The simplest routing strategy: distributes requests evenly across servers
//! in a circular fashion. Provides good fairness but ignores server state
//! (queue length, speed, etc.).

use crate::traits::*;
use rand::RngCore;

/// Round-robin router.
///
/// The cursor is the only state owned by the balancer; it advances once per
/// routed request and picks `servers[cursor % N]`.
pub struct RoundRobin {
    cursor: u64,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self { cursor: 0 }
    }
}

impl Default for RoundRobin {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchPolicy for RoundRobin {
    fn route(
        &mut self,
        _request: &RequestInfo,
        servers: &[ServerSnapshot],
        _clock: &dyn Clock,
        _rng: &mut dyn RngCore,
    ) -> RoutingDecision {
        if servers.is_empty() {
            return RoutingDecision::Reject;
        }

        let chosen = &servers[(self.cursor % servers.len() as u64) as usize];
        self.cursor += 1;
        RoutingDecision::Route(chosen.id)
    }

    fn name(&self) -> &str {
        "round_robin"
    }
}
