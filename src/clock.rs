//! Time sources for the tracking loop.
//!
//! Everything that measures elapsed time or waits goes through [`Clock`],
//! so the loop, the retry policy, and the accumulator can run against
//! simulated time in tests.

use std::{thread, time::Instant};

use jiff::{SignedDuration, Timestamp};

pub trait Clock {
    /// The current instant. Never goes backwards.
    fn now(&self) -> Timestamp;

    /// Blocks for `duration`. Zero or negative durations return immediately.
    fn sleep(&self, duration: SignedDuration);
}

/// Wall-clock time anchored once, then advanced by a monotonic `Instant`.
///
/// Wall-clock adjustments after startup cannot make `now` go backwards.
#[derive(Debug, Clone)]
pub struct SystemClock {
    anchor: Timestamp,
    started: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            anchor: Timestamp::now(),
            started: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let elapsed = SignedDuration::try_from(self.started.elapsed()).unwrap_or(SignedDuration::MAX);
        self.anchor.checked_add(elapsed).unwrap_or(Timestamp::MAX)
    }

    fn sleep(&self, duration: SignedDuration) {
        if let Ok(d) = std::time::Duration::try_from(duration)
            && !d.is_zero()
        {
            thread::sleep(d);
        }
    }
}

/// Simulated time for tests. Clones share the same timeline; `sleep` advances it.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: std::rc::Rc<std::cell::Cell<Timestamp>>,
}

#[cfg(test)]
impl ManualClock {
    pub fn starting_at(seconds: i64) -> Self {
        Self {
            now: std::rc::Rc::new(std::cell::Cell::new(
                Timestamp::from_second(seconds).unwrap(),
            )),
        }
    }

    pub fn advance(&self, duration: SignedDuration) {
        self.now.set(self.now.get() + duration);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }

    fn sleep(&self, duration: SignedDuration) {
        if duration.is_positive() {
            self.advance(duration);
        }
    }
}
