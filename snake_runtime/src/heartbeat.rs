//! Heartbeat stamping (Active side) and liveness watching (Dormant side).
//!
//! Both halves take explicit `Instant`s; neither reads the clock.

use std::time::{Duration, Instant};

/// Cadence and counter for the Active holder's heartbeat.
#[derive(Debug, Clone)]
pub struct HeartbeatPulse {
    interval: Duration,
    counter: u64,
    last_beat: Instant,
}

impl HeartbeatPulse {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            counter: 0,
            last_beat: now,
        }
    }

    /// Continue counting from `counter`, as just written by a claim.
    pub fn restart(&mut self, counter: u64, now: Instant) {
        self.counter = counter;
        self.last_beat = now;
    }

    /// Never fall behind a value already in the region, so the published
    /// heartbeat only moves forward.
    pub fn catch_up(&mut self, seen: u64) {
        self.counter = self.counter.max(seen);
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_beat) >= self.interval
    }

    /// Advance the counter; the caller writes and syncs it.
    pub fn beat(&mut self, now: Instant) -> u64 {
        self.counter = self.counter.wrapping_add(1);
        self.last_beat = now;
        self.counter
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    Dead { silent_for: Duration },
}

/// Remembers the last heartbeat value seen and when it last changed.
#[derive(Debug, Clone)]
pub struct LivenessWatch {
    timeout: Duration,
    last_value: u64,
    changed_at: Instant,
}

impl LivenessWatch {
    pub fn new(timeout: Duration, value: u64, now: Instant) -> Self {
        Self {
            timeout,
            last_value: value,
            changed_at: now,
        }
    }

    /// Start a fresh observation window from `value`.
    pub fn reset(&mut self, value: u64, now: Instant) {
        self.last_value = value;
        self.changed_at = now;
    }

    /// Any change counts as a beat, including a counter that went backwards
    /// because a new owner restarted it.
    pub fn observe(&mut self, value: u64, now: Instant) -> Liveness {
        if value != self.last_value {
            self.reset(value, now);
            return Liveness::Alive;
        }
        let silent_for = now.saturating_duration_since(self.changed_at);
        if silent_for > self.timeout {
            Liveness::Dead { silent_for }
        } else {
            Liveness::Alive
        }
    }

    pub fn last_value(&self) -> u64 {
        self.last_value
    }
}
