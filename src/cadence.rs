//! Fixed-period pacing for the polling loop.

use jiff::{SignedDuration, Timestamp};

use crate::clock::Clock;

/// Paces a loop to one iteration per period using an explicit next deadline.
///
/// Deadlines advance by exactly one period, so short sleeps don't accumulate
/// error over a long run. When an iteration overruns its deadline the
/// schedule restarts from now: the loop drifts under load rather than firing
/// a burst of catch-up iterations.
#[derive(Debug, Clone)]
pub struct Cadence {
    period: SignedDuration,
    next: Timestamp,
}

impl Cadence {
    /// The first deadline is one period after `start`.
    pub fn new(period: SignedDuration, start: Timestamp) -> Self {
        Self {
            period,
            next: start + period,
        }
    }

    /// Sleeps until the next deadline, then schedules the one after.
    ///
    /// Returns how long it slept.
    pub fn wait(&mut self, clock: &impl Clock) -> SignedDuration {
        let now = clock.now();
        let remaining = self.next.duration_since(now);
        if remaining.is_positive() {
            clock.sleep(remaining);
            self.next += self.period;
            remaining
        } else {
            self.next = now + self.period;
            SignedDuration::ZERO
        }
    }
}
