//! Trip types: the unit of tracked driving activity.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{DriverId, Location};

/// Identifies a trip. Derived from the start timestamp in milliseconds,
/// so ordering by id is chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(i64);

impl TripId {
    /// Derives an id from a start time, bumped past `after` when the clock
    /// would otherwise repeat or go backwards.
    pub fn starting_at(start: Timestamp, after: Option<TripId>) -> Self {
        let candidate = start.as_millisecond();
        match after {
            Some(TripId(prev)) if candidate <= prev => Self(prev + 1),
            _ => Self(candidate),
        }
    }
}

impl From<i64> for TripId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One continuous driving session.
///
/// `end_time` is the instant fuel burn was last integrated up to, so the
/// next sample's elapsed time is measured from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub trip_id: TripId,
    pub driver_id: DriverId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub start_odometer: Option<f64>,
    pub end_odometer: Option<f64>,
    pub start_location: Location,
    pub end_location: Location,
    pub fuel_level_start: Option<f64>,
    pub fuel_level_end: Option<f64>,
    pub total_fuel_burn_liters: f64,

    /// Closed trips are immutable.
    pub closed: bool,
}

impl Trip {
    /// A fresh, open trip with nothing burned yet.
    pub fn open(
        trip_id: TripId,
        driver_id: DriverId,
        start_time: Timestamp,
        odometer: Option<f64>,
        location: Location,
        fuel_level: Option<f64>,
    ) -> Self {
        Self {
            trip_id,
            driver_id,
            start_time,
            end_time: start_time,
            start_odometer: odometer,
            end_odometer: odometer,
            start_location: location.clone(),
            end_location: location,
            fuel_level_start: fuel_level,
            fuel_level_end: fuel_level,
            total_fuel_burn_liters: 0.0,
            closed: false,
        }
    }

    /// Advances the end odometer. Lower readings are ignored.
    pub fn advance_odometer(&mut self, reading: f64) {
        match self.end_odometer {
            Some(current) if reading < current => {}
            _ => self.end_odometer = Some(reading),
        }
    }

    /// Checks the record-level invariants of a persisted trip.
    pub(crate) fn check(&self) -> Result<(), String> {
        if !self.total_fuel_burn_liters.is_finite() || self.total_fuel_burn_liters < 0.0 {
            return Err(format!(
                "trip {}: invalid fuel burn {}",
                self.trip_id, self.total_fuel_burn_liters
            ));
        }
        if self.end_time < self.start_time {
            return Err(format!("trip {}: end_time precedes start_time", self.trip_id));
        }
        Ok(())
    }
}
