//! Adaptive dispatch policy.
//!
//! Under light load (fewer queued requests in total than there are servers)
//! routing randomly is as good as anything and costs no scan. Once requests
//! start piling up it switches to shortest-queue routing.

use crate::random::pick_uniform;
use crate::shortest_queue::pick_shortest;
use crate::traits::*;
use rand::RngCore;

/// Adaptive router.
pub struct Adaptive;

impl Adaptive {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Adaptive {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchPolicy for Adaptive {
    fn route(
        &mut self,
        _request: &RequestInfo,
        servers: &[ServerSnapshot],
        _clock: &dyn Clock,
        rng: &mut dyn RngCore,
    ) -> RoutingDecision {
        let queued: u64 = servers.iter().map(|s| s.queue_length as u64).sum();
        if queued < servers.len() as u64 {
            pick_uniform(servers, rng)
        } else {
            pick_shortest(servers)
        }
    }

    fn name(&self) -> &str {
        "adaptive"
    }
}
