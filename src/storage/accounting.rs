//! Accounting storage: the refill window cursor and per-driver usage.

use std::{fs, io};

use crate::model::Accounting;

use super::{Result, Storage, StorageError, write_atomic};

const ACCOUNTING_FILE: &str = "accounting.json";

impl Storage {
    /// Loads accounting state. Before the first refill there is no file,
    /// which is the same as an empty window starting at the beginning of history.
    pub fn load_accounting(&self) -> Result<Accounting> {
        let path = self.path(ACCOUNTING_FILE);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Accounting::default()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&json).map_err(|e| StorageError::Corrupt {
            path,
            reason: e.to_string(),
        })
    }

    /// Replaces accounting state atomically.
    pub fn save_accounting(&self, accounting: &Accounting) -> Result<()> {
        let mut json = serde_json::to_string_pretty(accounting)?;
        json.push('\n');
        write_atomic(&self.path(ACCOUNTING_FILE), json.as_bytes())?;
        Ok(())
    }
}
