//! Replays a recorded drive as a live gateway.
//!
//! A recording is a JSON-lines file, one sample per line:
//!
//! ```text
//! {"odometer":1000.2,"fuel_level":61.5,"fuel_rate":6.1,"latitude":52.52,"longitude":13.40}
//! {"odometer":1000.3,"fuel_level":null,"fuel_rate":null}
//! ```
//!
//! Every field is optional; a missing or null field reads as "no data".
//! Each fuel-rate read moves to the next sample, so a recording plays back at
//! one sample per poll. The gateway disconnects once the last sample is used.

use std::{
    cell::RefCell,
    collections::VecDeque,
    fs, io,
    path::{Path, PathBuf},
    rc::Rc,
};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::model::Coordinate;

use super::{Connector, PositionSource, SensorGateway};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Sample {
    #[serde(default)]
    pub odometer: Option<f64>,
    #[serde(default)]
    pub fuel_level: Option<f64>,
    #[serde(default)]
    pub fuel_rate: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Default)]
struct Playback {
    pending: VecDeque<Sample>,
    current: Sample,
    connected: bool,
}

/// Parses a recording. Blank lines are skipped.
pub fn parse(contents: &str) -> Result<Vec<Sample>, serde_json::Error> {
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str)
        .collect()
}

/// Opens a recording file as a session. Each recording plays once.
#[derive(Debug)]
pub struct ReplayConnector {
    path: PathBuf,
    consumed: bool,
}

impl ReplayConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            consumed: false,
        }
    }

    fn load(path: &Path) -> io::Result<Vec<Sample>> {
        let contents = fs::read_to_string(path)?;
        parse(&contents).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl Connector for ReplayConnector {
    type Gateway = ReplayGateway;

    fn connect(&mut self) -> Option<ReplayGateway> {
        if self.consumed {
            return None;
        }
        match Self::load(&self.path) {
            Ok(samples) => {
                debug!(path = %self.path.display(), samples = samples.len(), "replay loaded");
                self.consumed = true;
                Some(ReplayGateway::from_samples(samples))
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "replay not readable");
                None
            }
        }
    }
}

/// A gateway backed by recorded samples.
#[derive(Debug, Clone)]
pub struct ReplayGateway {
    playback: Rc<RefCell<Playback>>,
}

impl ReplayGateway {
    /// The first sample becomes current immediately so that context reads
    /// made before the first poll have data.
    pub fn from_samples(samples: Vec<Sample>) -> Self {
        let mut pending: VecDeque<Sample> = samples.into();
        let current = pending.pop_front();
        let connected = current.is_some();
        Self {
            playback: Rc::new(RefCell::new(Playback {
                pending,
                current: current.unwrap_or_default(),
                connected,
            })),
        }
    }

    /// A position source reading from the same playback.
    pub fn positions(&self) -> ReplayPositions {
        ReplayPositions {
            playback: Rc::clone(&self.playback),
        }
    }

    fn read(&self, field: impl Fn(&Sample) -> Option<f64>) -> Option<f64> {
        let playback = self.playback.borrow();
        if !playback.connected {
            return None;
        }
        field(&playback.current)
    }
}

impl SensorGateway for ReplayGateway {
    fn is_connected(&self) -> bool {
        self.playback.borrow().connected
    }

    fn read_odometer(&mut self) -> Option<f64> {
        self.read(|s| s.odometer)
    }

    fn read_fuel_level(&mut self) -> Option<f64> {
        self.read(|s| s.fuel_level)
    }

    fn read_fuel_rate(&mut self) -> Option<f64> {
        let mut playback = self.playback.borrow_mut();
        if !playback.connected {
            return None;
        }
        let rate = playback.current.fuel_rate;
        let next = playback.pending.pop_front();
        match next {
            Some(next) => playback.current = next,
            None => playback.connected = false,
        }
        rate
    }
}

/// Position reads from a replay.
#[derive(Debug, Clone)]
pub struct ReplayPositions {
    playback: Rc<RefCell<Playback>>,
}

impl PositionSource for ReplayPositions {
    fn read_position(&mut self) -> Option<Coordinate> {
        let playback = self.playback.borrow();
        if !playback.connected {
            return None;
        }
        match (playback.current.latitude, playback.current.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinate {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}
