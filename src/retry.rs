//! Bounded retry with a fixed interval.

use jiff::SignedDuration;

use crate::clock::Clock;

/// Retries an attempt at a fixed interval until it succeeds or the timeout elapses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub interval: SignedDuration,
    pub timeout: SignedDuration,
}

/// The policy ran out of time without a successful attempt.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("gave up after {attempts} attempt(s) over {elapsed:#}")]
pub struct RetryExhausted {
    pub attempts: u32,
    pub elapsed: SignedDuration,
}

impl RetryPolicy {
    /// Runs `attempt` immediately, then once per interval.
    ///
    /// Gives up once the elapsed time since the first attempt reaches the timeout.
    pub fn run<T>(
        &self,
        clock: &impl Clock,
        mut attempt: impl FnMut() -> Option<T>,
    ) -> Result<T, RetryExhausted> {
        let started = clock.now();
        let mut attempts = 0;
        loop {
            attempts += 1;
            if let Some(value) = attempt() {
                return Ok(value);
            }
            let elapsed = clock.now().duration_since(started);
            if elapsed >= self.timeout {
                return Err(RetryExhausted { attempts, elapsed });
            }
            clock.sleep(self.interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::clock::ManualClock;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            interval: SignedDuration::from_secs(1),
            timeout: SignedDuration::from_secs(30),
        }
    }

    #[test]
    fn first_success_does_not_wait() {
        let clock = ManualClock::starting_at(0);
        let value = policy().run(&clock, || Some(7)).unwrap();

        assert_eq!(value, 7);
        assert_eq!(clock.now().as_second(), 0);
    }

    #[test]
    fn retries_at_interval_until_success() {
        let clock = ManualClock::starting_at(0);
        let mut calls = 0;
        let value = policy()
            .run(&clock, || {
                calls += 1;
                (calls == 4).then_some("up")
            })
            .unwrap();

        assert_eq!(value, "up");
        assert_eq!(calls, 4);
        assert_eq!(clock.now().as_second(), 3);
    }

    #[test]
    fn gives_up_at_timeout() {
        let clock = ManualClock::starting_at(0);
        let err = policy().run(&clock, || None::<()>).unwrap_err();

        // One attempt at t=0, then one per second through t=30.
        assert_eq!(err.attempts, 31);
        assert_eq!(err.elapsed, SignedDuration::from_secs(30));
    }
}
