//! Fuel accumulation: integrating fuel-rate samples into liters burned.
//!
//! The active trip is owned by an [`ActiveTripHandle`] that the tracking loop
//! passes into every call. Nothing else holds a mutable reference to it.

use jiff::Timestamp;
use tracing::trace;

use crate::{
    model::{FailureKind, Location, Trip, TripId},
    sensor::{self, SensorGateway},
    storage::FailureLog,
};

/// Exclusive ownership of the open trip.
#[derive(Debug)]
pub struct ActiveTripHandle {
    trip: Trip,
}

/// Result of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A valid rate was integrated.
    Ok,

    /// No usable rate this cycle; the trip is unchanged.
    Degraded,
}

impl ActiveTripHandle {
    pub(crate) fn new(trip: Trip) -> Self {
        Self { trip }
    }

    pub fn trip(&self) -> &Trip {
        &self.trip
    }

    pub fn trip_id(&self) -> TripId {
        self.trip.trip_id
    }

    /// A copy of the trip as it stands, for committing.
    pub fn snapshot(&self) -> Trip {
        self.trip.clone()
    }

    /// Integrates `rate` (L/h) from the trip's end time up to `now`.
    ///
    /// Returns the liters added. Elapsed time before the end time counts as zero.
    pub fn integrate(&mut self, rate: f64, now: Timestamp) -> f64 {
        debug_assert!(rate.is_finite() && rate >= 0.0);
        let dt = now.duration_since(self.trip.end_time).as_secs_f64().max(0.0);
        let increment = rate * dt / 3600.0;
        self.trip.total_fuel_burn_liters += increment;
        if now > self.trip.end_time {
            self.trip.end_time = now;
        }
        increment
    }

    /// Updates the end-of-trip context captured at a checkpoint.
    pub fn record_context(&mut self, odometer: f64, location: Location, fuel_level: f64) {
        self.trip.advance_odometer(odometer);
        self.trip.end_location = location;
        self.trip.fuel_level_end = Some(fuel_level);
    }

    /// Closes the trip and hands back the final record.
    pub fn close(mut self) -> Trip {
        self.trip.closed = true;
        self.trip
    }
}

/// Reads the fuel rate and integrates it into the active trip.
///
/// An unusable reading is recorded as [`FailureKind::FuelRateUnavailable`]
/// and leaves the trip untouched.
pub fn poll_and_integrate(
    handle: &mut ActiveTripHandle,
    gateway: &mut impl SensorGateway,
    now: Timestamp,
    failures: &FailureLog,
) -> PollOutcome {
    match sensor::fuel_rate(gateway) {
        Some(rate) => {
            let added = handle.integrate(rate, now);
            trace!(rate, added, total = handle.trip.total_fuel_burn_liters, "integrated");
            PollOutcome::Ok
        }
        None => {
            failures.log(now, FailureKind::FuelRateUnavailable, sensor::odometer(gateway));
            PollOutcome::Degraded
        }
    }
}
