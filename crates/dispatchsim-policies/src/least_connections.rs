//! Least-connections dispatch policy.
//!
//! Routes each request to the server with the fewest outstanding requests
//! (queued plus the one in service). This is a simple load-aware strategy that
//! avoids hot spots.

use crate::traits::*;
use rand::RngCore;

/// Least connections router.
pub struct LeastConnections;

impl LeastConnections {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LeastConnections {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchPolicy for LeastConnections {
    fn route(
        &mut self,
        _request: &RequestInfo,
        servers: &[ServerSnapshot],
        _clock: &dyn Clock,
        _rng: &mut dyn RngCore,
    ) -> RoutingDecision {
        match servers.iter().min_by_key(|s| s.outstanding()) {
            Some(best) => RoutingDecision::Route(best.id),
            None => RoutingDecision::Reject,
        }
    }

    fn name(&self) -> &str {
        "least_connections"
    }
}
