//! Least-expected-delay dispatch policy.
//!
//! Weighs outstanding requests by server speed, so a fast server with a few
//! queued requests can still beat a slow idle one.

use crate::traits::*;
use rand::RngCore;

/// Least expected delay router.
pub struct LeastExpectedDelay;

impl LeastExpectedDelay {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LeastExpectedDelay {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchPolicy for LeastExpectedDelay {
    fn route(
        &mut self,
        _request: &RequestInfo,
        servers: &[ServerSnapshot],
        _clock: &dyn Clock,
        _rng: &mut dyn RngCore,
    ) -> RoutingDecision {
        match argmin_by(servers, |s| s.outstanding() as f64 / s.speed) {
            Some(best) => RoutingDecision::Route(best.id),
            None => RoutingDecision::Reject,
        }
    }

    fn name(&self) -> &str {
        "least_expected_delay"
    }
}
