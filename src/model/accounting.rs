//! Refill accounting: the attribution window and per-driver totals.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Driver, DriverId, RefillEvent, TripId};

/// Where the current accounting window starts and what has been attributed so far.
///
/// The window covers every trip after `last_refill_trip`; history is never
/// truncated, the cursor just moves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Accounting {
    /// Last trip included in a closed window. `None` until the first refill.
    pub last_refill_trip: Option<TripId>,

    /// Liters attributed to each driver across all closed windows.
    pub usage: BTreeMap<DriverId, f64>,
}

impl Accounting {
    /// Closes the window through `through`, crediting the event's per-driver burn.
    pub fn close_window(&mut self, event: &RefillEvent, through: TripId) {
        for (driver, liters) in &event.per_driver_burn {
            *self.usage.entry(driver.clone()).or_insert(0.0) += liters;
        }
        self.last_refill_trip = Some(through);
    }

    /// Copies attributed usage onto registry entries.
    pub fn apply_to(&self, drivers: &mut [Driver]) {
        for driver in drivers {
            driver.fuel_usage_liters = self.usage.get(&driver.driver_id).copied().unwrap_or(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;

    fn event(burns: &[(&str, f64)]) -> RefillEvent {
        RefillEvent {
            timestamp: Timestamp::UNIX_EPOCH,
            odometer: None,
            fuel_level_before: 10.0,
            fuel_level_after: 90.0,
            total_burn_since_last_refill: burns.iter().map(|(_, l)| l).sum(),
            per_driver_burn: burns
                .iter()
                .map(|(d, l)| (DriverId::from(*d), *l))
                .collect(),
        }
    }

    #[test]
    fn closing_window_accumulates_and_moves_cursor() {
        let mut accounting = Accounting::default();
        accounting.close_window(&event(&[("alice", 10.0), ("bob", 4.0)]), TripId::from(3));
        accounting.close_window(&event(&[("alice", 2.5)]), TripId::from(7));

        assert_eq!(accounting.last_refill_trip, Some(TripId::from(7)));
        assert!((accounting.usage[&DriverId::from("alice")] - 12.5).abs() < 1e-12);
        assert!((accounting.usage[&DriverId::from("bob")] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn apply_to_fills_registry_usage() {
        let mut accounting = Accounting::default();
        accounting.close_window(&event(&[("alice", 3.0)]), TripId::from(1));

        let mut drivers = vec![
            Driver {
                driver_id: DriverId::from("alice"),
                display_name: "Alice".into(),
                fuel_usage_liters: 0.0,
            },
            Driver {
                driver_id: DriverId::from("bob"),
                display_name: "Bob".into(),
                fuel_usage_liters: 99.0,
            },
        ];
        accounting.apply_to(&mut drivers);

        assert!((drivers[0].fuel_usage_liters - 3.0).abs() < 1e-12);
        assert!(drivers[1].fuel_usage_liters.abs() < 1e-12);
    }
}
