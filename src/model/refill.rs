//! Refill events: the output of an accounting closure.

use std::collections::BTreeMap;

use jiff::Timestamp;

use super::DriverId;

/// A detected refuelling, with the burn attributed since the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct RefillEvent {
    pub timestamp: Timestamp,
    pub odometer: Option<f64>,
    pub fuel_level_before: f64,
    pub fuel_level_after: f64,
    pub total_burn_since_last_refill: f64,
    pub per_driver_burn: BTreeMap<DriverId, f64>,
}
