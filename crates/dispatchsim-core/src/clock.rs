//! Virtual clock for discrete-event simulation.
//!
//! The [`SimClock`] tracks simulation time independently of wall-clock time,
//! advancing only when the scheduler resumes a process. This enables
//! deterministic, repeatable simulations regardless of host machine speed.

use crate::scheduler::SchedulerError;
use serde::{Deserialize, Serialize};

/// Virtual simulation clock, in abstract time units.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimClock {
    now: f64,
}

impl SimClock {
    /// Create a new clock starting at time zero.
    pub fn new() -> Self {
        Self { now: 0.0 }
    }

    /// Current virtual time.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Advance the clock to `time`.
    ///
    /// Moving backwards means the event ordering is broken, which is a kernel
    /// bug rather than bad input, so it is reported as
    /// [`SchedulerError::ClockRegression`].
    pub fn advance_to(&mut self, time: f64) -> Result<(), SchedulerError> {
        if time < self.now || time.is_nan() {
            return Err(SchedulerError::ClockRegression {
                current: self.now,
                target: time,
            });
        }
        self.now = time;
        Ok(())
    }
}
