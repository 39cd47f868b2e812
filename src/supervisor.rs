//! Connection supervision: getting a live session before tracking starts.

use tracing::{info, warn};

use crate::{
    clock::Clock,
    model::FailureKind,
    retry::{RetryExhausted, RetryPolicy},
    sensor::{Connector, SensorGateway},
    storage::FailureLog,
};

/// Opens a session and confirms it is live, retrying under `policy`.
///
/// On timeout a [`FailureKind::ConnectionTimeout`] record is written and
/// the caller must not open a trip.
pub fn establish<C: Connector>(
    connector: &mut C,
    policy: &RetryPolicy,
    clock: &impl Clock,
    failures: &FailureLog,
) -> Result<C::Gateway, RetryExhausted> {
    let result = policy.run(clock, || connector.connect().filter(|g| g.is_connected()));
    match &result {
        Ok(_) => info!("gateway connected"),
        Err(e) => {
            warn!(attempts = e.attempts, "gateway connection timed out");
            failures.log(clock.now(), FailureKind::ConnectionTimeout, None);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::SignedDuration;
    use tempfile::TempDir;

    use crate::{
        clock::ManualClock,
        sensor::mock::{MockConnector, MockGateway},
        storage::Storage,
    };

    fn policy() -> RetryPolicy {
        RetryPolicy {
            interval: SignedDuration::from_secs(1),
            timeout: SignedDuration::from_secs(30),
        }
    }

    fn failure_log() -> (TempDir, FailureLog) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path()).unwrap();
        (dir, storage.failure_log())
    }

    #[test]
    fn connects_after_retries() {
        let (_dir, failures) = failure_log();
        let clock = ManualClock::starting_at(0);
        let mut connector = MockConnector::succeeding_after(3, MockGateway::connected());

        let gateway = establish(&mut connector, &policy(), &clock, &failures).unwrap();

        assert!(gateway.is_connected());
        assert_eq!(connector.attempts, 4);
        assert!(failures.load().unwrap().is_empty());
    }

    #[test]
    fn session_that_is_not_live_keeps_retrying() {
        let (_dir, failures) = failure_log();
        let clock = ManualClock::starting_at(0);
        let gateway = MockGateway::default();
        let mut connector = MockConnector::succeeding_after(0, gateway);

        let err = establish(&mut connector, &policy(), &clock, &failures).unwrap_err();
        assert_eq!(err.attempts, 31);
    }

    #[test]
    fn timeout_is_recorded() {
        let (_dir, failures) = failure_log();
        let clock = ManualClock::starting_at(0);
        let mut connector = MockConnector::never(MockGateway::connected());

        let err = establish(&mut connector, &policy(), &clock, &failures).unwrap_err();

        assert_eq!(err.elapsed, SignedDuration::from_secs(30));
        let records = failures.load().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, FailureKind::ConnectionTimeout);
        assert_eq!(records[0].odometer, None);
    }
}
