//! Request model for the cluster simulation.
//!
//! Each [`Request`] is created by the generator at the instant it arrives and
//! is consumed exactly once by the worker of the server it was routed to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of work a request carries. The kind picks the mean service time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Compute,
    Io,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Compute => f.write_str("compute"),
            RequestKind::Io => f.write_str("io"),
        }
    }
}

/// A single request flowing through the simulated cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Unique request identifier, in arrival order.
    pub id: u64,
    /// Arrival time in virtual time units.
    pub arrival_time: f64,
    pub kind: RequestKind,
    /// Work multiplier applied to the kind's mean service time.
    pub size: f64,
}

impl Request {
    pub fn new(id: u64, arrival_time: f64, kind: RequestKind, size: f64) -> Self {
        Self {
            id,
            arrival_time,
            kind,
            size,
        }
    }

    /// Time the request has spent in the system if it completed at `now`.
    pub fn response_time(&self, now: f64) -> f64 {
        now - self.arrival_time
    }
}
