//! The telemetry boundary: what the tracker needs from the vehicle.
//!
//! The physical diagnostics link is out of scope. The tracker only sees these
//! traits, which return `None` for a reading that is transiently unavailable
//! rather than an error. Readings are validated here before any component
//! uses them, so a NaN or out-of-range value is indistinguishable from
//! "no data".

#[cfg(test)]
pub mod mock;
pub mod replay;

use crate::model::Coordinate;

/// A live session with the vehicle's diagnostics interface.
///
/// Reads take `&mut self`: the interface models a single serial/bus link,
/// so only one caller can query it at a time.
pub trait SensorGateway {
    fn is_connected(&self) -> bool;

    /// Odometer distance in kilometers.
    fn read_odometer(&mut self) -> Option<f64>;

    /// Fuel level as a percentage of tank capacity.
    fn read_fuel_level(&mut self) -> Option<f64>;

    /// Fuel consumption rate in liters per hour.
    fn read_fuel_rate(&mut self) -> Option<f64>;
}

/// Resolves the vehicle's current position.
pub trait PositionSource {
    fn read_position(&mut self) -> Option<Coordinate>;
}

/// Opens sessions with a gateway.
pub trait Connector {
    type Gateway: SensorGateway;

    /// One attempt to open a session. `None` when the device is not reachable.
    fn connect(&mut self) -> Option<Self::Gateway>;
}

/// A fuel rate usable for integration: finite and non-negative.
pub fn fuel_rate(gateway: &mut impl SensorGateway) -> Option<f64> {
    gateway
        .read_fuel_rate()
        .filter(|r| r.is_finite() && *r >= 0.0)
}

/// A fuel level within 0–100 percent.
pub fn fuel_level(gateway: &mut impl SensorGateway) -> Option<f64> {
    gateway
        .read_fuel_level()
        .filter(|l| l.is_finite() && (0.0..=100.0).contains(l))
}

/// A finite, non-negative odometer reading.
pub fn odometer(gateway: &mut impl SensorGateway) -> Option<f64> {
    gateway
        .read_odometer()
        .filter(|o| o.is_finite() && *o >= 0.0)
}

/// A position with finite coordinates in range.
pub fn position(source: &mut impl PositionSource) -> Option<Coordinate> {
    source.read_position().filter(|c| {
        c.latitude.is_finite()
            && c.longitude.is_finite()
            && (-90.0..=90.0).contains(&c.latitude)
            && (-180.0..=180.0).contains(&c.longitude)
    })
}
