//! Deferred tasks and the frame loop handle
//! Time is a simulated monotonic clock advanced by the caller, so every
//! timer is testable without a real frame clock.

use std::time::Duration;

struct Pending<T> {
    due: Duration,
    seq: u64,
    task: T,
}

/// Fire-and-forget delayed tasks on a single timeline.
/// Tasks are never cancelled or coalesced; each one fires exactly once.
pub struct Scheduler<T> {
    now: Duration,
    next_seq: u64,
    pending: Vec<Pending<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            pending: Vec::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn schedule(&mut self, delay: Duration, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending {
            due: self.now + delay,
            seq,
            task,
        });
    }

    /// Move the clock forward and hand back every task that came due,
    /// earliest first. Ties keep scheduling order.
    pub fn advance(&mut self, dt: Duration) -> Vec<T> {
        self.now += dt;
        let now = self.now;

        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.due <= now);
        self.pending = rest;

        due.sort_by_key(|p| (p.due, p.seq));
        due.into_iter().map(|p| p.task).collect()
    }
}

/// Handle for the self-rescheduling per-frame tick.
/// Stopping it is a one-shot transition.
#[derive(Debug)]
pub struct FrameLoop {
    running: bool,
    frames: u64,
}

impl FrameLoop {
    pub fn start() -> Self {
        Self {
            running: true,
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Claim the next frame. Returns false once cancelled.
    pub fn next_frame(&mut self) -> bool {
        if self.running {
            self.frames += 1;
        }
        self.running
    }

    /// Returns true only for the call that actually stopped the loop.
    pub fn cancel(&mut self) -> bool {
        std::mem::replace(&mut self.running, false)
    }
}
