//! The trip ledger: every trip ever recorded, in chronological order.

use std::collections::HashMap;

use super::{Trip, TripId};

/// Ways an update can violate the ledger's ordering or immutability rules.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("trip {0} is closed and cannot be modified")]
    ClosedTrip(TripId),

    #[error("trip {id} is older than the latest trip {latest}")]
    OutOfOrder { id: TripId, latest: TripId },

    #[error("trip {0} appears more than once")]
    Duplicate(TripId),

    #[error("trip {0} is open but is not the latest trip")]
    StrayOpenTrip(TripId),

    #[error("{0}")]
    InvalidTrip(String),
}

/// Ordered mapping from trip id to trip.
///
/// Trips are kept in a sequence sorted by id, with an index for lookups.
/// Only the latest trip may be open.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripLedger {
    trips: Vec<Trip>,
    index: HashMap<TripId, usize>,
}

impl TripLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger from persisted trips, validating ordering.
    pub fn from_trips(trips: Vec<Trip>) -> Result<Self, LedgerError> {
        let mut ledger = Self::new();
        let count = trips.len();
        for (pos, trip) in trips.into_iter().enumerate() {
            trip.check().map_err(LedgerError::InvalidTrip)?;
            if let Some(latest) = ledger.latest() {
                if trip.trip_id == latest.trip_id {
                    return Err(LedgerError::Duplicate(trip.trip_id));
                }
                if trip.trip_id < latest.trip_id {
                    return Err(LedgerError::OutOfOrder {
                        id: trip.trip_id,
                        latest: latest.trip_id,
                    });
                }
            }
            if !trip.closed && pos + 1 != count {
                return Err(LedgerError::StrayOpenTrip(trip.trip_id));
            }
            ledger.push(trip);
        }
        Ok(ledger)
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    /// The most recently started trip.
    pub fn latest(&self) -> Option<&Trip> {
        self.trips.last()
    }

    /// Inserts a new trip or replaces the open record with the same id.
    ///
    /// Replacing a closed trip is only accepted when nothing changed.
    pub fn upsert(&mut self, trip: Trip) -> Result<(), LedgerError> {
        trip.check().map_err(LedgerError::InvalidTrip)?;
        if let Some(&i) = self.index.get(&trip.trip_id) {
            let existing = &self.trips[i];
            if existing.closed {
                if *existing == trip {
                    return Ok(());
                }
                return Err(LedgerError::ClosedTrip(trip.trip_id));
            }
            self.trips[i] = trip;
            return Ok(());
        }
        if let Some(latest) = self.latest() {
            if trip.trip_id < latest.trip_id {
                return Err(LedgerError::OutOfOrder {
                    id: trip.trip_id,
                    latest: latest.trip_id,
                });
            }
            if !latest.closed {
                return Err(LedgerError::StrayOpenTrip(latest.trip_id));
            }
        }
        self.push(trip);
        Ok(())
    }

    /// Closes the latest trip if it is still open, e.g. after a crash.
    ///
    /// Returns the id of the trip that was closed.
    pub fn close_latest(&mut self) -> Option<TripId> {
        let latest = self.trips.last_mut()?;
        if latest.closed {
            return None;
        }
        latest.closed = true;
        Some(latest.trip_id)
    }

    /// Trips started after `cursor`, or all trips when there is no cursor.
    pub fn since(&self, cursor: Option<TripId>) -> &[Trip] {
        match cursor {
            None => &self.trips,
            Some(id) => {
                let start = self.trips.partition_point(|t| t.trip_id <= id);
                &self.trips[start..]
            }
        }
    }

    fn push(&mut self, trip: Trip) {
        self.index.insert(trip.trip_id, self.trips.len());
        self.trips.push(trip);
    }
}
