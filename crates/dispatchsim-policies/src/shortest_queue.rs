//! Shortest-queue dispatch policy.
//!
//! Routes each request to the server with the fewest waiting requests. The
//! request currently in service is not counted; ties go to the server that
//! appears first in the list.

use crate::traits::*;
use rand::RngCore;

/// Shortest queue router.
pub struct ShortestQueue;

impl ShortestQueue {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ShortestQueue {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn pick_shortest(servers: &[ServerSnapshot]) -> RoutingDecision {
    match servers.iter().min_by_key(|s| s.queue_length) {
        Some(best) => RoutingDecision::Route(best.id),
        None => RoutingDecision::Reject,
    }
}

impl DispatchPolicy for ShortestQueue {
    fn route(
        &mut self,
        _request: &RequestInfo,
        servers: &[ServerSnapshot],
        _clock: &dyn Clock,
        _rng: &mut dyn RngCore,
    ) -> RoutingDecision {
        pick_shortest(servers)
    }

    fn name(&self) -> &str {
        "shortest_queue"
    }
}
