//! Refill log: one row per detected refuelling.
//!
//! Per-driver burn is packed into a single field as `driver=liters` pairs
//! separated by `;`, so the header never changes as drivers come and go.

use std::collections::BTreeMap;

use crate::model::{DriverId, RefillEvent};

use super::{Result, Storage, StorageError, rows};

const REFILLS_FILE: &str = "refills.csv";
const HEADER: [&str; 6] = [
    "timestamp",
    "odometer",
    "fuel_level_before",
    "fuel_level_after",
    "total_burn_since_last_refill",
    "per_driver_burn",
];

impl Storage {
    /// Appends a refill event.
    pub fn append_refill(&self, event: &RefillEvent) -> Result<()> {
        let per_driver = event
            .per_driver_burn
            .iter()
            .map(|(driver, liters)| format!("{driver}={liters}"))
            .collect::<Vec<_>>()
            .join(";");
        let fields = [
            event.timestamp.to_string(),
            event.odometer.map(|o| o.to_string()).unwrap_or_default(),
            event.fuel_level_before.to_string(),
            event.fuel_level_after.to_string(),
            event.total_burn_since_last_refill.to_string(),
            per_driver,
        ];
        rows::append_row(&self.path(REFILLS_FILE), &HEADER, &fields)?;
        Ok(())
    }

    /// Loads every refill event in the order they were detected.
    pub fn load_refills(&self) -> Result<Vec<RefillEvent>> {
        let path = self.path(REFILLS_FILE);
        let corrupt = |reason: String| StorageError::Corrupt {
            path: path.clone(),
            reason,
        };
        let number = |field: &str, name: &str| -> Result<f64> {
            field
                .parse()
                .map_err(|e| corrupt(format!("invalid {name}: {e}")))
        };

        rows::read_rows(&path)?
            .into_iter()
            .map(|row| -> Result<RefillEvent> {
                let [timestamp, odometer, before, after, total, per_driver] = row.as_slice() else {
                    return Err(corrupt(format!("expected 6 fields, found {}", row.len())));
                };
                let mut per_driver_burn = BTreeMap::new();
                for pair in per_driver.split(';').filter(|p| !p.is_empty()) {
                    let (driver, liters) = pair
                        .rsplit_once('=')
                        .ok_or_else(|| corrupt(format!("invalid driver burn '{pair}'")))?;
                    per_driver_burn.insert(DriverId::from(driver), number(liters, "driver burn")?);
                }
                Ok(RefillEvent {
                    timestamp: timestamp
                        .parse()
                        .map_err(|e| corrupt(format!("invalid timestamp: {e}")))?,
                    odometer: if odometer.is_empty() {
                        None
                    } else {
                        Some(number(odometer, "odometer")?)
                    },
                    fuel_level_before: number(before, "fuel_level_before")?,
                    fuel_level_after: number(after, "fuel_level_after")?,
                    total_burn_since_last_refill: number(total, "total burn")?,
                    per_driver_burn,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;
    use tempfile::TempDir;

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("data")).unwrap();
        (dir, storage)
    }

    fn sample_event() -> RefillEvent {
        RefillEvent {
            timestamp: Timestamp::new(1_700_000_000, 0).unwrap(),
            odometer: Some(1042.5),
            fuel_level_before: 60.0,
            fuel_level_after: 66.0,
            total_burn_since_last_refill: 92.5,
            per_driver_burn: [
                (DriverId::from("alice"), 90.0),
                (DriverId::from("bob"), 2.5),
            ]
            .into_iter()
            .collect(),
        }
    }

    #[test]
    fn append_and_load_refills() {
        let (_dir, storage) = test_storage();
        let event = sample_event();

        storage.append_refill(&event).unwrap();
        storage.append_refill(&event).unwrap();

        let loaded = storage.load_refills().unwrap();
        assert_eq!(loaded, vec![event.clone(), event]);
    }

    #[test]
    fn quoted_driver_id_round_trips() {
        let (_dir, storage) = test_storage();
        let mut event = sample_event();
        let id = "smith, \"jr\"";
        assert!(DriverId::check(id).is_ok());
        event.per_driver_burn.insert(DriverId::from(id), 6.0);

        storage.append_refill(&event).unwrap();
        assert_eq!(storage.load_refills().unwrap(), vec![event]);
    }

    #[test]
    fn unknown_odometer_is_empty_field() {
        let (_dir, storage) = test_storage();
        let mut event = sample_event();
        event.odometer = None;
        event.per_driver_burn.clear();

        storage.append_refill(&event).unwrap();
        assert_eq!(storage.load_refills().unwrap(), vec![event]);
    }

    #[test]
    fn load_without_log_is_empty() {
        let (_dir, storage) = test_storage();
        assert!(storage.load_refills().unwrap().is_empty());
    }
}
