//! Core data model for fueltrack.
//!
//! These types describe what is tracked and persisted:
//! trips and the ledger that orders them, drivers and their attributed
//! fuel usage, failure records, and refill events.

mod accounting;
mod driver;
mod failure;
mod ledger;
mod location;
mod refill;
mod trip;

pub use accounting::Accounting;
pub use driver::{Driver, DriverId};
pub use failure::{FailureKind, FailureRecord};
pub use ledger::{LedgerError, TripLedger};
pub use location::{Coordinate, Location};
pub use refill::RefillEvent;
pub use trip::{Trip, TripId};
