//! Power-of-two-choices (P2C) dispatch policy.
//!
//! Samples two distinct servers uniformly at random and routes to the one with
//! the shorter queue. Gets most of the benefit of a full shortest-queue scan
//! while only looking at two servers.

use crate::traits::*;
use rand::{Rng, RngCore};

/// Power of two choices router.
pub struct PowerOfTwoChoices;

impl PowerOfTwoChoices {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PowerOfTwoChoices {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchPolicy for PowerOfTwoChoices {
    fn route(
        &mut self,
        _request: &RequestInfo,
        servers: &[ServerSnapshot],
        _clock: &dyn Clock,
        rng: &mut dyn RngCore,
    ) -> RoutingDecision {
        match servers.len() {
            0 => RoutingDecision::Reject,
            1 => RoutingDecision::Route(servers[0].id),
            n => {
                let first = rng.gen_range(0..n);
                // Draw from the remaining n-1 slots so the pair is distinct.
                let mut second = rng.gen_range(0..n - 1);
                if second >= first {
                    second += 1;
                }
                let (a, b) = (&servers[first], &servers[second]);
                let chosen = if b.queue_length < a.queue_length { b } else { a };
                RoutingDecision::Route(chosen.id)
            }
        }
    }

    fn name(&self) -> &str {
        "power_of_two_choices"
    }
}
