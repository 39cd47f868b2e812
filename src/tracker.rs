//! The tracking session: open a trip, poll at a fixed cadence, checkpoint, close.
//!
//! A [`Tracker`] owns the gateway and the in-memory ledger for one run.
//! Everything happens on the calling thread: commits run inline between
//! polls, so at most one write is ever in flight.

use std::fmt;

use jiff::{SignedDuration, Timestamp};
use tracing::{debug, info, warn};

use crate::{
    accumulator::{self, ActiveTripHandle, PollOutcome},
    cadence::Cadence,
    clock::Clock,
    model::{Accounting, DriverId, FailureKind, Location, RefillEvent, Trip, TripId, TripLedger},
    refill::RefillDetector,
    retry::{RetryExhausted, RetryPolicy},
    sensor::{self, PositionSource, SensorGateway},
    shutdown::ShutdownSignal,
    storage::{FailureLog, Storage, StorageError},
};

/// Errors that end a tracking run.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("could not connect to the vehicle: {0}")]
    ConnectionTimeout(#[from] RetryExhausted),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Timing and threshold knobs for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerSettings {
    pub poll_interval: SignedDuration,
    pub checkpoint_interval: SignedDuration,

    /// Bounded wait for the fuel level when a trip opens.
    pub fuel_level_wait: RetryPolicy,

    pub refill_threshold_percent: f64,
}

/// What a run did, for the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub trip_id: TripId,
    pub liters: f64,
    pub polls: u64,
    pub degraded_polls: u64,
    pub commits: u64,
    pub refill: bool,
    pub closed: bool,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Trip {}", self.trip_id)?;
        writeln!(f, "  burned:   {:.3} L", self.liters)?;
        writeln!(f, "  polls:    {} ({} degraded)", self.polls, self.degraded_polls)?;
        writeln!(f, "  commits:  {}", self.commits)?;
        writeln!(f, "  refill:   {}", if self.refill { "yes" } else { "no" })?;
        write!(f, "  closed:   {}", if self.closed { "yes" } else { "no" })
    }
}

pub struct Tracker<G, P, C> {
    settings: TrackerSettings,
    storage: Storage,
    failures: FailureLog,
    gateway: G,
    position: P,
    clock: C,
    ledger: TripLedger,
    accounting: Accounting,
    detector: RefillDetector,
    driver: DriverId,
}

impl<G: SensorGateway, P: PositionSource, C: Clock> Tracker<G, P, C> {
    /// Loads the ledger and accounting state for a run.
    ///
    /// A ledger that exists but cannot be read is fatal; it is left on disk
    /// untouched.
    pub fn new(
        storage: Storage,
        gateway: G,
        position: P,
        clock: C,
        driver: DriverId,
        settings: TrackerSettings,
    ) -> Result<Self, TrackError> {
        let ledger = storage.load_ledger_or_default()?;
        let accounting = storage.load_accounting()?;
        debug!(
            trips = ledger.len(),
            cursor = ?accounting.last_refill_trip,
            "ledger loaded"
        );
        Ok(Self {
            failures: storage.failure_log(),
            detector: RefillDetector::new(settings.refill_threshold_percent),
            settings,
            storage,
            gateway,
            position,
            clock,
            ledger,
            accounting,
            driver,
        })
    }

    /// Opens a new trip, settling a refill against the previous one first.
    ///
    /// A trip left open by an earlier run is closed here. The new trip is
    /// committed before it is returned; a failed write is recorded and
    /// retried at the next checkpoint.
    pub fn open_trip(&mut self) -> Result<(ActiveTripHandle, Option<RefillEvent>), TrackError> {
        let gateway = &mut self.gateway;
        let fuel_level = self
            .settings
            .fuel_level_wait
            .run(&self.clock, || sensor::fuel_level(&mut *gateway))
            .ok();
        let odometer = sensor::odometer(&mut self.gateway);
        let location = Location::from(sensor::position(&mut self.position));
        let now = self.clock.now();
        if fuel_level.is_none() {
            warn!("fuel level unavailable at trip open");
            self.failures.log(now, FailureKind::ContextUnavailable, odometer);
        }

        if let Some(id) = self.ledger.close_latest() {
            info!(trip = %id, "closed trip left open by an earlier run");
        }

        let refill = self.settle_refill(fuel_level, odometer, now)?;

        let latest = self.ledger.latest().map(|t| t.trip_id);
        let trip = Trip::open(
            TripId::starting_at(now, latest),
            self.driver.clone(),
            now,
            odometer,
            location,
            fuel_level,
        );
        info!(trip = %trip.trip_id, driver = %trip.driver_id, ?odometer, ?fuel_level, "trip opened");
        self.commit(&trip);
        Ok((ActiveTripHandle::new(trip), refill))
    }

    /// Credits drivers and logs the event when the tank was refilled since
    /// the latest trip.
    fn settle_refill(
        &mut self,
        fuel_level: Option<f64>,
        odometer: Option<f64>,
        now: Timestamp,
    ) -> Result<Option<RefillEvent>, TrackError> {
        let Some(event) = self
            .detector
            .detect(&self.ledger, &self.accounting, fuel_level, odometer, now)
        else {
            return Ok(None);
        };
        let Some(through) = self.ledger.latest().map(|t| t.trip_id) else {
            return Ok(None);
        };

        self.accounting.close_window(&event, through);
        self.storage.save_accounting(&self.accounting)?;
        if let Err(e) = self.storage.append_refill(&event) {
            warn!(error = %e, "refill event not logged");
            self.failures.log(now, FailureKind::PersistenceWriteFailure, odometer);
        }
        info!(
            before = event.fuel_level_before,
            after = event.fuel_level_after,
            liters = event.total_burn_since_last_refill,
            "refill detected"
        );
        Ok(Some(event))
    }

    /// One poll cycle against the active trip.
    pub fn poll(&mut self, handle: &mut ActiveTripHandle) -> PollOutcome {
        let now = self.clock.now();
        accumulator::poll_and_integrate(handle, &mut self.gateway, now, &self.failures)
    }

    /// Refreshes the trip's end context and commits a snapshot.
    ///
    /// Returns whether a commit landed. Missing context skips the commit.
    /// `end_time` is left at the last integrated poll so the next poll's
    /// interval is measured from where fuel was last accumulated.
    pub fn checkpoint(&mut self, handle: &mut ActiveTripHandle) -> bool {
        if !self.refresh_context(handle) {
            return false;
        }
        self.commit(&handle.snapshot())
    }

    /// Refreshes the end context, closes the trip, and commits it.
    ///
    /// Returns the closed trip when the commit landed.
    pub fn finish(&mut self, mut handle: ActiveTripHandle) -> Option<Trip> {
        if !self.refresh_context(&mut handle) {
            return None;
        }
        let trip = handle.close();
        self.commit(&trip).then_some(trip)
    }

    /// Runs one trip until `shutdown` is triggered or the gateway drops.
    pub fn run(&mut self, shutdown: &ShutdownSignal) -> Result<RunSummary, TrackError> {
        let (mut handle, refill) = self.open_trip()?;
        let mut summary = RunSummary {
            trip_id: handle.trip_id(),
            liters: 0.0,
            polls: 0,
            degraded_polls: 0,
            commits: 1,
            refill: refill.is_some(),
            closed: false,
        };

        let started = self.clock.now();
        let mut cadence = Cadence::new(self.settings.poll_interval, started);
        let mut next_checkpoint = started + self.settings.checkpoint_interval;

        while !shutdown.is_triggered() {
            cadence.wait(&self.clock);
            summary.polls += 1;
            if self.poll(&mut handle) == PollOutcome::Degraded {
                summary.degraded_polls += 1;
            }

            let now = self.clock.now();
            if !self.gateway.is_connected() {
                warn!(trip = %handle.trip_id(), "gateway disconnected");
                self.failures.log(now, FailureKind::SensorReadError, None);
                break;
            }
            if now >= next_checkpoint {
                if self.checkpoint(&mut handle) {
                    summary.commits += 1;
                }
                next_checkpoint = now + self.settings.checkpoint_interval;
            }
        }

        summary.liters = handle.trip().total_fuel_burn_liters;
        if self.gateway.is_connected() {
            if self.finish(handle).is_some() {
                summary.commits += 1;
                summary.closed = true;
            }
        } else {
            warn!("gateway not connected, final commit skipped");
        }

        info!(
            trip = %summary.trip_id,
            liters = summary.liters,
            polls = summary.polls,
            degraded = summary.degraded_polls,
            commits = summary.commits,
            "run finished"
        );
        Ok(summary)
    }

    fn refresh_context(&mut self, handle: &mut ActiveTripHandle) -> bool {
        let odometer = sensor::odometer(&mut self.gateway);
        let position = sensor::position(&mut self.position);
        let fuel_level = sensor::fuel_level(&mut self.gateway);
        let (Some(reading), Some(coordinate), Some(level)) = (odometer, position, fuel_level) else {
            debug!(
                odometer = odometer.is_some(),
                position = position.is_some(),
                fuel_level = fuel_level.is_some(),
                "checkpoint skipped, context unavailable"
            );
            self.failures
                .log(self.clock.now(), FailureKind::ContextUnavailable, odometer);
            return false;
        };
        handle.record_context(reading, Location::At(coordinate), level);
        true
    }

    fn commit(&mut self, trip: &Trip) -> bool {
        match self.storage.commit(&mut self.ledger, trip) {
            Ok(()) => {
                debug!(
                    trip = %trip.trip_id,
                    liters = trip.total_fuel_burn_liters,
                    closed = trip.closed,
                    "committed"
                );
                true
            }
            Err(e) => {
                warn!(trip = %trip.trip_id, error = %e, "commit failed");
                self.failures.log(
                    self.clock.now(),
                    FailureKind::PersistenceWriteFailure,
                    trip.end_odometer,
                );
                false
            }
        }
    }
}
