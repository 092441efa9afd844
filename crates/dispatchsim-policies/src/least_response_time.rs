//! Least-response-time dispatch policy.
//!
//! Routes to the server whose smoothed (EMA) response time is lowest. The
//! estimate only moves on completions, so it lags behind sudden bursts.

use crate::traits::*;
use rand::RngCore;

/// Least response time router.
pub struct LeastResponseTime;

impl LeastResponseTime {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LeastResponseTime {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchPolicy for LeastResponseTime {
    fn route(
        &mut self,
        _request: &RequestInfo,
        servers: &[ServerSnapshot],
        _clock: &dyn Clock,
        _rng: &mut dyn RngCore,
    ) -> RoutingDecision {
        match argmin_by(servers, |s| s.smoothed_response_time) {
            Some(best) => RoutingDecision::Route(best.id),
            None => RoutingDecision::Reject,
        }
    }

    fn name(&self) -> &str {
        "least_response_time"
    }
}
