//! Uniform random dispatch policy.

use crate::traits::*;
use rand::{Rng, RngCore};

/// Picks a server uniformly at random.
pub struct Random;

impl Random {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::new()
    }
}

/// Uniform pick shared with policies that fall back to random routing.
pub(crate) fn pick_uniform(servers: &[ServerSnapshot], rng: &mut dyn RngCore) -> RoutingDecision {
    if servers.is_empty() {
        return RoutingDecision::Reject;
    }
    let idx = rng.gen_range(0..servers.len());
    RoutingDecision::Route(servers[idx].id)
}

impl DispatchPolicy for Random {
    fn route(
        &mut self,
        _request: &RequestInfo,
        servers: &[ServerSnapshot],
        _clock: &dyn Clock,
        rng: &mut dyn RngCore,
    ) -> RoutingDecision {
        pick_uniform(servers, rng)
    }

    fn name(&self) -> &str {
        "random"
    }
}
