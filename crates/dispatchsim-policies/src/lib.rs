//! Built-in dispatch policies for DispatchSim.
//!
//! This crate provides the [`DispatchPolicy`] trait and the built-in
//! implementations a load balancer can run:
//!
//! | Policy | Strategy | Needs RNG |
//! |--------|----------|-----------|
//! | [`Random`] | Uniform pick | yes |
//! | [`RoundRobin`] | Cycle through servers | no |
//! | [`ShortestQueue`] | Fewest waiting requests | no |
//! | [`LeastConnections`] | Fewest waiting + in service | no |
//! | [`PowerOfTwoChoices`] | Shorter queue of two random picks | yes |
//! | [`LeastLoad`] | Lowest busy-time / elapsed-time | no |
//! | [`LeastExpectedDelay`] | Outstanding requests over speed | no |
//! | [`LeastResponseTime`] | Lowest smoothed response time | no |
//! | [`Adaptive`] | Random when light, shortest queue when loaded | yes |

pub mod adaptive;
pub mod least_connections;
pub mod least_expected_delay;
pub mod least_load;
pub mod least_response_time;
pub mod power_of_two;
pub mod random;
pub mod round_robin;
pub mod shortest_queue;
pub mod traits;

pub use adaptive::Adaptive;
pub use least_connections::LeastConnections;
pub use least_expected_delay::LeastExpectedDelay;
pub use least_load::LeastLoad;
pub use least_response_time::LeastResponseTime;
pub use power_of_two::PowerOfTwoChoices;
pub use random::Random;
pub use round_robin::RoundRobin;
pub use shortest_queue::ShortestQueue;
pub use traits::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown dispatch policy: {0}")]
pub struct UnknownPolicy(pub String);

/// Every built-in policy, by canonical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Random,
    RoundRobin,
    ShortestQueue,
    LeastConnections,
    PowerOfTwoChoices,
    LeastLoad,
    LeastExpectedDelay,
    LeastResponseTime,
    Adaptive,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 9] = [
        PolicyKind::Random,
        PolicyKind::RoundRobin,
        PolicyKind::ShortestQueue,
        PolicyKind::LeastConnections,
        PolicyKind::PowerOfTwoChoices,
        PolicyKind::LeastLoad,
        PolicyKind::LeastExpectedDelay,
        PolicyKind::LeastResponseTime,
        PolicyKind::Adaptive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::Random => "random",
            PolicyKind::RoundRobin => "round_robin",
            PolicyKind::ShortestQueue => "shortest_queue",
            PolicyKind::LeastConnections => "least_connections",
            PolicyKind::PowerOfTwoChoices => "power_of_two_choices",
            PolicyKind::LeastLoad => "least_load",
            PolicyKind::LeastExpectedDelay => "least_expected_delay",
            PolicyKind::LeastResponseTime => "least_response_time",
            PolicyKind::Adaptive => "adaptive",
        }
    }

    /// Construct a fresh policy instance with its own (empty) state.
    pub fn build(&self) -> Box<dyn DispatchPolicy> {
        match self {
            PolicyKind::Random => Box::new(Random::new()),
            PolicyKind::RoundRobin => Box::new(RoundRobin::new()),
            PolicyKind::ShortestQueue => Box::new(ShortestQueue::new()),
            PolicyKind::LeastConnections => Box::new(LeastConnections::new()),
            PolicyKind::PowerOfTwoChoices => Box::new(PowerOfTwoChoices::new()),
            PolicyKind::LeastLoad => Box::new(LeastLoad::new()),
            PolicyKind::LeastExpectedDelay => Box::new(LeastExpectedDelay::new()),
            PolicyKind::LeastResponseTime => Box::new(LeastResponseTime::new()),
            PolicyKind::Adaptive => Box::new(Adaptive::new()),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(PolicyKind::Random),
            "round_robin" | "roundrobin" => Ok(PolicyKind::RoundRobin),
            "shortest_queue" | "shortest" => Ok(PolicyKind::ShortestQueue),
            "least_connections" => Ok(PolicyKind::LeastConnections),
            "power_of_two_choices" | "p2c" => Ok(PolicyKind::PowerOfTwoChoices),
            "least_load" => Ok(PolicyKind::LeastLoad),
            "least_expected_delay" => Ok(PolicyKind::LeastExpectedDelay),
            "least_response_time" => Ok(PolicyKind::LeastResponseTime),
            "adaptive" => Ok(PolicyKind::Adaptive),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Create a dispatch policy by name.
pub fn policy_by_name(name: &str) -> Option<Box<dyn DispatchPolicy>> {
    name.parse::<PolicyKind>().ok().map(|kind| kind.build())
}

/// List all available built-in policy names.
pub fn available_policies() -> Vec<&'static str> {
    PolicyKind::ALL.iter().map(|k| k.as_str()).collect()
}
