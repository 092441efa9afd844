//! Event scheduler for the discrete-event simulation.
//!
//! The scheduler owns the [`SimClock`] and a min-heap of pending
//! resumptions keyed by `(resume_time, sequence)`. Every simulated process
//! (the request generator and each server's worker) is an explicit state
//! machine: it registers a resumption before giving up control, and the
//! scheduler hands control back to exactly one process at a time through the
//! [`Resume`] trait.
//!
//! Equal resume times are served strictly in insertion order, which keeps runs
//! bit-for-bit reproducible under a fixed seed.

use crate::clock::SimClock;
use log::error;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use thiserror::Error;

/// Internal consistency failures of the kernel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("clock cannot move backwards: current={current}, target={target}")]
    ClockRegression { current: f64, target: f64 },
    #[error("invalid resume delay: {0}")]
    InvalidDelay(f64),
    #[error("no process registered as {0}")]
    UnknownProcess(ProcessId),
}

/// Identifies a simulated process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessId {
    /// The Poisson arrival process.
    Generator,
    /// The worker loop of the server with this id.
    Worker(u32),
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessId::Generator => f.write_str("generator"),
            ProcessId::Worker(id) => write!(f, "worker-{}", id),
        }
    }
}

/// A pending resumption in the priority queue.
#[derive(Debug, Clone)]
struct PendingResume {
    time: f64,
    sequence: u64,
    process: ProcessId,
}

impl PartialEq for PendingResume {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PendingResume {}

impl PartialOrd for PendingResume {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingResume {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; we want min-heap
        other
            .time
            .total_cmp(&self.time)
            .then(other.sequence.cmp(&self.sequence))
    }
}

/// Hands control to a process when its resumption comes due.
///
/// Implementors own the process state; the scheduler only knows ids. A
/// resumed process runs until its next suspension point, registering its next
/// resumption (if any) on the scheduler it is given.
pub trait Resume {
    fn resume(
        &mut self,
        process: ProcessId,
        scheduler: &mut EventScheduler,
    ) -> Result<(), SchedulerError>;
}

/// Virtual-time event scheduler.
#[derive(Debug, Default)]
pub struct EventScheduler {
    clock: SimClock,
    pending: BinaryHeap<PendingResume>,
    /// Sequence counter for tie-breaking.
    sequence: u64,
    /// Total resumptions handed out.
    resumptions: u64,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Register that `process` resumes `delay` time units from now.
    pub fn schedule_after(&mut self, process: ProcessId, delay: f64) -> Result<(), SchedulerError> {
        if !(delay >= 0.0) || delay.is_infinite() {
            return Err(SchedulerError::InvalidDelay(delay));
        }
        self.push(self.clock.now() + delay, process);
        Ok(())
    }

    /// Make `process` eligible to resume at the current instant.
    ///
    /// Used to wake a worker blocked on an empty queue.
    pub fn wake(&mut self, process: ProcessId) {
        self.push(self.clock.now(), process);
    }

    fn push(&mut self, time: f64, process: ProcessId) {
        self.pending.push(PendingResume {
            time,
            sequence: self.sequence,
            process,
        });
        self.sequence += 1;
    }

    /// Number of pending resumptions.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Total resumptions performed so far.
    pub fn resumptions(&self) -> u64 {
        self.resumptions
    }

    /// Resume processes in `(time, sequence)` order until the next pending
    /// resumption lies beyond `horizon` or none remain. The clock is left at
    /// `horizon` (or later, if it was already past it).
    ///
    /// Returns the number of resumptions performed by this call.
    pub fn run_until<R: Resume>(
        &mut self,
        horizon: f64,
        world: &mut R,
    ) -> Result<u64, SchedulerError> {
        let start = self.resumptions;

        while self.pending.peek().is_some_and(|next| next.time <= horizon) {
            let Some(next) = self.pending.pop() else {
                break;
            };
            if let Err(e) = self.clock.advance_to(next.time) {
                error!("scheduler fault while resuming {}: {}", next.process, e);
                return Err(e);
            }
            self.resumptions += 1;
            world.resume(next.process, self)?;
        }

        if horizon > self.clock.now() {
            self.clock.advance_to(horizon)?;
        }
        Ok(self.resumptions - start)
    }

    #[cfg(test)]
    pub(crate) fn schedule_at(&mut self, time: f64, process: ProcessId) {
        self.push(time, process);
    }
}
