//! Poisson request generator.
//!
//! Inter-arrival gaps are exponential with rate λ. Each arrival gets a kind
//! drawn uniformly from {compute, io} and a size drawn uniformly from
//! `[min_size, max_size]`.

use crate::request::{Request, RequestKind};
use rand::Rng;
use rand_distr::{Distribution, Exp};

/// Default bounds of the uniform request size draw.
pub const DEFAULT_SIZE_RANGE: (f64, f64) = (1.0, 5.0);

/// Generates timestamped requests for the arrival process.
#[derive(Debug, Clone)]
pub struct RequestGenerator {
    inter_arrival: Exp<f64>,
    rate: f64,
    min_size: f64,
    max_size: f64,
    next_id: u64,
}

impl RequestGenerator {
    /// Create a generator with arrival rate `rate`. Returns `None` unless the
    /// rate is positive and finite.
    pub fn new(rate: f64) -> Option<Self> {
        Self::with_size_range(rate, DEFAULT_SIZE_RANGE.0, DEFAULT_SIZE_RANGE.1)
    }

    pub fn with_size_range(rate: f64, min_size: f64, max_size: f64) -> Option<Self> {
        if !(rate > 0.0) || !rate.is_finite() || !(min_size > 0.0) || max_size < min_size {
            return None;
        }
        let inter_arrival = Exp::new(rate).ok()?;
        Some(Self {
            inter_arrival,
            rate,
            min_size,
            max_size,
            next_id: 0,
        })
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Draw the gap until the next arrival.
    pub fn next_gap<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.inter_arrival.sample(rng)
    }

    /// Build the request arriving at `now`.
    pub fn next_request<R: Rng + ?Sized>(&mut self, now: f64, rng: &mut R) -> Request {
        let kind = if rng.gen_bool(0.5) {
            RequestKind::Compute
        } else {
            RequestKind::Io
        };
        let size = rng.gen_range(self.min_size..=self.max_size);
        self.request_at(now, kind, size)
    }

    /// Build a request with a given kind and size, consuming the next id.
    pub fn request_at(&mut self, now: f64, kind: RequestKind, size: f64) -> Request {
        let request = Request::new(self.next_id, now, kind, size);
        self.next_id += 1;
        request
    }

    /// Number of requests generated so far.
    pub fn generated(&self) -> u64 {
        self.next_id
    }
}
