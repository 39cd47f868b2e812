//! Driver registry: the list of people who may drive the vehicle.
//!
//! Read from `drivers.toml` in the data directory:
//!
//! ```toml
//! [[driver]]
//! id = "alice"
//! name = "Alice Example"
//! ```

use std::{collections::HashSet, fs, io};

use serde::Deserialize;

use crate::model::{Driver, DriverId};

use super::{Result, Storage, StorageError};

const DRIVERS_FILE: &str = "drivers.toml";

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default)]
    driver: Vec<RegistryEntry>,
}

#[derive(Deserialize)]
struct RegistryEntry {
    id: String,
    name: Option<String>,
}

impl Storage {
    /// Loads the driver registry with zero usage. A missing file is an empty registry.
    pub fn load_drivers(&self) -> Result<Vec<Driver>> {
        let path = self.path(DRIVERS_FILE);
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let file: RegistryFile = toml::from_str(&contents).map_err(|e| StorageError::Corrupt {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let mut seen = HashSet::new();
        let mut drivers = Vec::with_capacity(file.driver.len());
        for entry in file.driver {
            if entry.id.trim().is_empty() || !seen.insert(entry.id.clone()) {
                return Err(StorageError::Corrupt {
                    path,
                    reason: format!("empty or duplicate driver id '{}'", entry.id),
                });
            }
            if let Err(reason) = DriverId::check(&entry.id) {
                return Err(StorageError::Corrupt { path, reason });
            }
            drivers.push(Driver {
                display_name: entry.name.unwrap_or_else(|| entry.id.clone()),
                driver_id: DriverId::from(entry.id),
                fuel_usage_liters: 0.0,
            });
        }
        Ok(drivers)
    }
}
