//! Failure records: the durable trail of anomalies.

use std::{fmt, str::FromStr};

use jiff::Timestamp;

/// The fixed set of anomalies the tracker records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No live session could be established within the connect timeout.
    ConnectionTimeout,

    /// The fuel rate read was absent or invalid for a poll cycle.
    FuelRateUnavailable,

    /// Odometer, position, or fuel level could not be read.
    ContextUnavailable,

    /// The gateway dropped or returned a reading that could not be used.
    SensorReadError,

    /// A checkpoint write did not reach disk.
    PersistenceWriteFailure,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConnectionTimeout => "connection_timeout",
            Self::FuelRateUnavailable => "fuel_rate_unavailable",
            Self::ContextUnavailable => "context_unavailable",
            Self::SensorReadError => "sensor_read_error",
            Self::PersistenceWriteFailure => "persistence_write_failure",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connection_timeout" => Ok(Self::ConnectionTimeout),
            "fuel_rate_unavailable" => Ok(Self::FuelRateUnavailable),
            "context_unavailable" => Ok(Self::ContextUnavailable),
            "sensor_read_error" => Ok(Self::SensorReadError),
            "persistence_write_failure" => Ok(Self::PersistenceWriteFailure),
            other => Err(format!("unknown failure kind: {other}")),
        }
    }
}

/// One row of the failure log. Never mutated once written.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureRecord {
    pub timestamp: Timestamp,
    pub odometer: Option<f64>,
    pub kind: FailureKind,
}
