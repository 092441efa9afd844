//! Load balancer front end.
//!
//! Wraps a [`DispatchPolicy`] and feeds it fresh snapshots of every server at
//! the instant a request arrives, so routing never acts on stale state.

use crate::clock::SimClock;
use crate::request::Request;
use crate::server::SimulatedServer;
use dispatchsim_policies::{self, DispatchPolicy, PolicyKind, RequestInfo, RoutingDecision};
use log::{debug, trace};
use rand::RngCore;

/// Clock adapter implementing the policies crate's Clock trait.
struct ClockAdapter<'a>(&'a SimClock);

impl<'a> dispatchsim_policies::Clock for ClockAdapter<'a> {
    fn now(&self) -> f64 {
        self.0.now()
    }
}

fn to_policy_request(req: &Request) -> RequestInfo {
    RequestInfo {
        id: req.id,
        arrival_time: req.arrival_time,
        size: req.size,
    }
}

/// Routes arrivals to servers according to one policy.
pub struct LoadBalancer {
    kind: PolicyKind,
    policy: Box<dyn DispatchPolicy>,
}

impl LoadBalancer {
    pub fn new(kind: PolicyKind) -> Self {
        debug!("constructing load balancer with policy {}", kind);
        Self {
            kind,
            policy: kind.build(),
        }
    }

    pub fn kind(&self) -> PolicyKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        self.policy.name()
    }

    /// Pick the index of the server that should receive `request`.
    ///
    /// Returns `None` only when the policy rejects the request, which the
    /// built-in policies do solely for an empty server list.
    pub fn route(
        &mut self,
        request: &Request,
        servers: &[SimulatedServer],
        clock: &SimClock,
        rng: &mut dyn RngCore,
    ) -> Option<usize> {
        let snapshots: Vec<_> = servers.iter().map(|s| s.snapshot()).collect();
        let decision = self.policy.route(
            &to_policy_request(request),
            &snapshots,
            &ClockAdapter(clock),
            rng,
        );

        match decision {
            RoutingDecision::Route(id) => {
                let idx = servers.iter().position(|s| s.id == id)?;
                trace!(
                    "{} routed request {} to server {} (queue {})",
                    self.kind,
                    request.id,
                    id,
                    snapshots[idx].queue_length
                );
                Some(idx)
            }
            RoutingDecision::Reject => None,
        }
    }
}
