//! Refill detection: spotting a refuel between trips and closing the accounting window.
//!
//! The comparison uses the fuel level recorded at the end of the previous
//! trip, not a fresh reading, so a reconnect between trips can't race it.

use std::collections::BTreeMap;

use jiff::Timestamp;

use crate::model::{Accounting, DriverId, RefillEvent, TripLedger};

/// Percentage points the level must rise by, exclusive, to count as a refill.
pub const DEFAULT_THRESHOLD_PERCENT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefillDetector {
    threshold_percent: f64,
}

impl Default for RefillDetector {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_PERCENT)
    }
}

impl RefillDetector {
    pub fn new(threshold_percent: f64) -> Self {
        Self { threshold_percent }
    }

    /// Compares `current_fuel_level` against the latest trip's closing level.
    ///
    /// Returns the refill event when the level rose by more than the
    /// threshold. The event's burn covers every trip after the accounting
    /// cursor, grouped by driver. No baseline (empty ledger or a trip that
    /// never recorded a level) or no current level means no refill. A
    /// baseline trip that already closed a window is never counted twice.
    pub fn detect(
        &self,
        ledger: &TripLedger,
        accounting: &Accounting,
        current_fuel_level: Option<f64>,
        odometer: Option<f64>,
        at: Timestamp,
    ) -> Option<RefillEvent> {
        let latest = ledger.latest()?;
        if accounting.last_refill_trip == Some(latest.trip_id) {
            return None;
        }
        let baseline = latest.fuel_level_end?;
        let current = current_fuel_level?;
        if current <= baseline + self.threshold_percent {
            return None;
        }

        let mut per_driver_burn: BTreeMap<DriverId, f64> = BTreeMap::new();
        for trip in ledger.since(accounting.last_refill_trip) {
            *per_driver_burn.entry(trip.driver_id.clone()).or_insert(0.0) +=
                trip.total_fuel_burn_liters;
        }
        let total_burn_since_last_refill = per_driver_burn.values().sum();

        Some(RefillEvent {
            timestamp: at,
            odometer,
            fuel_level_before: baseline,
            fuel_level_after: current,
            total_burn_since_last_refill,
            per_driver_burn,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::{Location, Trip, TripId};

    fn closed_trip(id: i64, driver: &str, burn: f64, fuel_level_end: Option<f64>) -> Trip {
        let mut trip = Trip::open(
            TripId::from(id),
            DriverId::from(driver),
            Timestamp::from_second(id).unwrap(),
            None,
            Location::Unknown,
            None,
        );
        trip.total_fuel_burn_liters = burn;
        trip.fuel_level_end = fuel_level_end;
        trip.closed = true;
        trip
    }

    fn ledger_with_baseline(level: f64) -> TripLedger {
        TripLedger::from_trips(vec![closed_trip(1, "alice", 12.0, Some(level))]).unwrap()
    }

    fn detect(ledger: &TripLedger, accounting: &Accounting, current: f64) -> Option<RefillEvent> {
        RefillDetector::default().detect(
            ledger,
            accounting,
            Some(current),
            Some(1200.0),
            Timestamp::UNIX_EPOCH,
        )
    }

    #[test]
    fn rise_just_under_threshold_is_not_a_refill() {
        let ledger = ledger_with_baseline(40.0);
        assert!(detect(&ledger, &Accounting::default(), 44.9).is_none());
    }

    #[test]
    fn rise_of_exactly_threshold_is_not_a_refill() {
        let ledger = ledger_with_baseline(40.0);
        assert!(detect(&ledger, &Accounting::default(), 45.0).is_none());
    }

    #[test]
    fn rise_just_over_threshold_is_a_refill() {
        let ledger = ledger_with_baseline(40.0);
        let event = detect(&ledger, &Accounting::default(), 45.1).unwrap();

        assert_eq!(event.fuel_level_before, 40.0);
        assert_eq!(event.fuel_level_after, 45.1);
        assert_eq!(event.odometer, Some(1200.0));
        assert_eq!(event.total_burn_since_last_refill, 12.0);
    }

    #[test]
    fn empty_ledger_has_no_baseline() {
        assert!(detect(&TripLedger::new(), &Accounting::default(), 100.0).is_none());
    }

    #[test]
    fn missing_levels_skip_detection() {
        let ledger =
            TripLedger::from_trips(vec![closed_trip(1, "alice", 12.0, None)]).unwrap();
        assert!(detect(&ledger, &Accounting::default(), 90.0).is_none());

        let ledger = ledger_with_baseline(10.0);
        let event = RefillDetector::default().detect(
            &ledger,
            &Accounting::default(),
            None,
            None,
            Timestamp::UNIX_EPOCH,
        );
        assert!(event.is_none());
    }

    #[test]
    fn burn_is_grouped_by_driver_after_cursor() {
        let ledger = TripLedger::from_trips(vec![
            closed_trip(1, "alice", 100.0, Some(80.0)),
            closed_trip(2, "alice", 10.0, Some(70.0)),
            closed_trip(3, "bob", 4.5, Some(65.0)),
            closed_trip(4, "alice", 2.0, Some(20.0)),
        ])
        .unwrap();
        let accounting = Accounting {
            last_refill_trip: Some(TripId::from(1)),
            ..Accounting::default()
        };

        let event = detect(&ledger, &accounting, 95.0).unwrap();

        assert_eq!(event.per_driver_burn[&DriverId::from("alice")], 12.0);
        assert_eq!(event.per_driver_burn[&DriverId::from("bob")], 4.5);
        assert_eq!(event.total_burn_since_last_refill, 16.5);
        assert_eq!(event.fuel_level_before, 20.0);
    }

    #[test]
    fn baseline_already_accounted_is_not_counted_again() {
        let ledger = ledger_with_baseline(40.0);
        let accounting = Accounting {
            last_refill_trip: Some(TripId::from(1)),
            ..Accounting::default()
        };
        assert!(detect(&ledger, &accounting, 90.0).is_none());
    }

    #[test]
    fn custom_threshold_is_honored() {
        let ledger = ledger_with_baseline(40.0);
        let detector = RefillDetector::new(1.0);
        let event = detector.detect(
            &ledger,
            &Accounting::default(),
            Some(41.5),
            None,
            Timestamp::UNIX_EPOCH,
        );
        assert!(event.is_some());
    }
}
