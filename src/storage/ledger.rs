//! Ledger storage: load and commit the trip ledger.

use std::{fs, io};

use serde::{Deserialize, Serialize};

use crate::model::{Trip, TripLedger};

use super::{Result, StagedWrite, Storage, StorageError};

const LEDGER_FILE: &str = "ledger.json";

#[derive(Serialize)]
struct LedgerFileRef<'a> {
    trips: &'a [Trip],
}

#[derive(Deserialize)]
struct LedgerFile {
    trips: Vec<Trip>,
}

impl Storage {
    /// Loads the committed ledger.
    ///
    /// Fails with [`StorageError::LedgerMissing`] when nothing has been
    /// committed yet, and [`StorageError::Corrupt`] when the file cannot be
    /// parsed or breaks ledger ordering.
    pub fn load_ledger(&self) -> Result<TripLedger> {
        let path = self.path(LEDGER_FILE);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::LedgerMissing(path));
            }
            Err(e) => return Err(e.into()),
        };
        let file: LedgerFile = serde_json::from_str(&json).map_err(|e| StorageError::Corrupt {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        TripLedger::from_trips(file.trips).map_err(|e| StorageError::Corrupt {
            path,
            reason: e.to_string(),
        })
    }

    /// Loads the committed ledger, treating a missing file as empty history.
    pub fn load_ledger_or_default(&self) -> Result<TripLedger> {
        match self.load_ledger() {
            Err(StorageError::LedgerMissing(_)) => Ok(TripLedger::new()),
            other => other,
        }
    }

    /// Merges `trip` into `ledger` and writes the whole ledger atomically.
    ///
    /// The in-memory ledger keeps the merged trip even if the write fails,
    /// so the next commit writes it again.
    pub fn commit(&self, ledger: &mut TripLedger, trip: &Trip) -> Result<()> {
        ledger.upsert(trip.clone())?;
        self.stage_ledger(ledger)?.publish()?;
        Ok(())
    }

    pub(crate) fn stage_ledger(&self, ledger: &TripLedger) -> Result<StagedWrite> {
        let mut json = serde_json::to_string_pretty(&LedgerFileRef {
            trips: ledger.trips(),
        })?;
        json.push('\n');
        Ok(StagedWrite::stage(&self.path(LEDGER_FILE), json.as_bytes())?)
    }
}
