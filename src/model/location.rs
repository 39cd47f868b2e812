//! Position snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Where the vehicle was when a snapshot was taken.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Location {
    #[default]
    Unknown,
    At(Coordinate),
}

impl From<Option<Coordinate>> for Location {
    fn from(value: Option<Coordinate>) -> Self {
        value.map_or(Self::Unknown, Self::At)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::At(c) => write!(f, "{:.5},{:.5}", c.latitude, c.longitude),
        }
    }
}
