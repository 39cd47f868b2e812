//! Output formatting for CLI display.

use crate::model::{FailureRecord, RefillEvent, Trip};

/// One line per trip: id, state, driver, start, burn, distance, last position.
pub(super) fn format_trip(trip: &Trip) -> String {
    let status = if trip.closed { "closed" } else { "open" };
    format!(
        "{}  [{status}] [{}]  {}  {:.3} L  {}  {} → {}",
        trip.trip_id,
        trip.driver_id,
        trip.start_time,
        trip.total_fuel_burn_liters,
        format_distance(trip.start_odometer, trip.end_odometer),
        trip.start_location,
        trip.end_location,
    )
}

pub(super) fn format_refill(event: &RefillEvent) -> String {
    let drivers = event
        .per_driver_burn
        .iter()
        .map(|(driver, liters)| format!("{driver} {liters:.3} L"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{}  {:.1}% → {:.1}%  {:.3} L  odometer {}  [{drivers}]",
        event.timestamp,
        event.fuel_level_before,
        event.fuel_level_after,
        event.total_burn_since_last_refill,
        format_reading(event.odometer),
    )
}

pub(super) fn format_failure(record: &FailureRecord) -> String {
    format!(
        "{}  {}  odometer {}",
        record.timestamp,
        record.kind,
        format_reading(record.odometer)
    )
}

fn format_reading(value: Option<f64>) -> String {
    value.map_or_else(|| "unknown".to_string(), |v| format!("{v:.1}"))
}

fn format_distance(start: Option<f64>, end: Option<f64>) -> String {
    match (start, end) {
        (Some(start), Some(end)) => format!("{:.1} km", end - start),
        _ => "distance unknown".to_string(),
    }
}
