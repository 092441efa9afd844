//! Least-load dispatch policy.
//!
//! Estimates each server's utilization so far as cumulative busy time over
//! elapsed virtual time and routes to the least utilized one. Servers with no
//! completed work look idle regardless of what is queued on them.

use crate::traits::*;
use rand::RngCore;

/// Added to the elapsed time so the estimate is defined at `now = 0`.
pub const LOAD_EPSILON: f64 = 1e-9;

/// Least load router.
pub struct LeastLoad;

impl LeastLoad {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LeastLoad {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchPolicy for LeastLoad {
    fn route(
        &mut self,
        _request: &RequestInfo,
        servers: &[ServerSnapshot],
        clock: &dyn Clock,
        _rng: &mut dyn RngCore,
    ) -> RoutingDecision {
        let elapsed = clock.now() + LOAD_EPSILON;
        match argmin_by(servers, |s| s.cumulative_busy_time / elapsed) {
            Some(best) => RoutingDecision::Route(best.id),
            None => RoutingDecision::Reject,
        }
    }

    fn name(&self) -> &str {
        "least_load"
    }
}
