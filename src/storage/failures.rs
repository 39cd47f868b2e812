//! Failure log: the append-only record of anomalies.
//!
//! This is the reporting channel of last resort, so writing to it never
//! fails the caller. A record that cannot be written is dropped with a
//! warning on the tracing output.

use std::path::PathBuf;

use jiff::Timestamp;
use tracing::{debug, warn};

use crate::model::{FailureKind, FailureRecord};

use super::{Result, Storage, StorageError, rows};

const FAILURES_FILE: &str = "failures.csv";
const HEADER: [&str; 3] = ["timestamp", "odometer", "failure_kind"];
const UNKNOWN: &str = "unknown";

/// Appends failure records to `failures.csv`.
#[derive(Debug, Clone)]
pub struct FailureLog {
    path: PathBuf,
}

impl Storage {
    pub fn failure_log(&self) -> FailureLog {
        FailureLog {
            path: self.path(FAILURES_FILE),
        }
    }
}

impl FailureLog {
    /// Records a failure. Best effort: write errors are swallowed.
    pub fn log(&self, at: Timestamp, kind: FailureKind, odometer: Option<f64>) {
        debug!(%kind, ?odometer, "failure recorded");
        let fields = [
            at.to_string(),
            odometer.map_or_else(|| UNKNOWN.to_string(), |o| o.to_string()),
            kind.to_string(),
        ];
        if let Err(e) = rows::append_row(&self.path, &HEADER, &fields) {
            warn!(%kind, error = %e, "dropped failure record");
        }
    }

    /// Reads back every record written so far.
    pub fn load(&self) -> Result<Vec<FailureRecord>> {
        rows::read_rows(&self.path)?
            .into_iter()
            .map(|row| self.parse_row(&row))
            .collect()
    }

    fn parse_row(&self, row: &[String]) -> Result<FailureRecord> {
        let corrupt = |reason: String| StorageError::Corrupt {
            path: self.path.clone(),
            reason,
        };
        let [timestamp, odometer, kind] = row else {
            return Err(corrupt(format!("expected 3 fields, found {}", row.len())));
        };
        Ok(FailureRecord {
            timestamp: timestamp
                .parse()
                .map_err(|e| corrupt(format!("invalid timestamp: {e}")))?,
            odometer: match odometer.as_str() {
                UNKNOWN => None,
                o => Some(o.parse().map_err(|e| corrupt(format!("invalid odometer: {e}")))?),
            },
            kind: kind.parse().map_err(corrupt)?,
        })
    }
}
