//! CLI interface for fueltrack.
//!
//! `fueltrack run` tracks one trip against a gateway session until Ctrl+C or
//! until the vehicle disconnects. The remaining commands are read-only
//! listings of what is on disk.

mod format;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::{
    clock::SystemClock,
    config::Config,
    identity,
    model::{Driver, DriverId},
    sensor::replay::ReplayConnector,
    shutdown::{self, ShutdownSignal},
    storage::Storage,
    supervisor,
    tracker::{TrackError, Tracker},
};

use format::{format_failure, format_refill, format_trip};

/// Fueltrack: per-trip fuel accounting from live vehicle telemetry.
#[derive(Debug, Parser)]
#[command(name = "fueltrack", version, after_long_help = USAGE_HELP)]
pub struct Cli {
    /// Config file to use instead of `~/.fueltrack/config.toml`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

const USAGE_HELP: &str = r"Tracking a trip:
  1. fueltrack run --replay drive.jsonl --driver alice
     → opens a trip, settles any refill, polls until the recording ends
  2. fueltrack trips
  3. fueltrack drivers

Driver resolution: --driver, then FUELTRACK_DRIVER, then default-driver in the config.";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Track one trip until Ctrl+C or until the gateway disconnects.
    ///
    /// Prints a summary of the trip when the run ends.
    Run {
        /// Recorded telemetry (JSON lines) to play back as the gateway.
        #[arg(long)]
        replay: PathBuf,

        /// Driver for this trip. Falls back to `FUELTRACK_DRIVER`, then the config.
        #[arg(long)]
        driver: Option<String>,
    },

    /// List trips in the ledger, oldest first.
    Trips,

    /// List drivers with the fuel attributed to them at refills.
    Drivers,

    /// List detected refills.
    Refills,

    /// List recorded failures.
    Failures,
}

/// Run the CLI, returning an error message on failure.
pub fn run(cli: Cli, config: &Config) -> Result<(), String> {
    let root = config
        .data_dir
        .clone()
        .or_else(Storage::default_root)
        .ok_or("could not determine home directory")?;
    let storage =
        Storage::new(root).map_err(|e| format!("failed to initialize storage: {e}"))?;

    match cli.command {
        Command::Run { replay, driver } => cmd_run(config, &storage, replay, driver.as_deref()),
        Command::Trips => cmd_trips(&storage),
        Command::Drivers => cmd_drivers(&storage),
        Command::Refills => cmd_refills(&storage),
        Command::Failures => cmd_failures(&storage),
    }
}

fn cmd_run(
    config: &Config,
    storage: &Storage,
    replay: PathBuf,
    driver: Option<&str>,
) -> Result<(), String> {
    let registry = storage
        .load_drivers()
        .map_err(|e| format!("failed to load drivers: {e}"))?;
    let driver = identity::resolve_driver(driver, config.default_driver.as_deref())?;
    identity::check_registered(&driver, &registry)?;

    info!(%driver, data_dir = %storage.root().display(), "starting run");

    let shutdown = ShutdownSignal::new();
    shutdown::install_ctrl_c(shutdown.clone())
        .map_err(|e| format!("failed to install Ctrl+C handler: {e}"))?;

    let clock = SystemClock::new();
    let mut connector = ReplayConnector::new(replay);
    let gateway = supervisor::establish(
        &mut connector,
        &config.connect_policy(),
        &clock,
        &storage.failure_log(),
    )
    .map_err(|e| TrackError::from(e).to_string())?;
    let positions = gateway.positions();

    let mut tracker = Tracker::new(
        storage.clone(),
        gateway,
        positions,
        clock,
        driver,
        config.tracker_settings(),
    )
    .map_err(|e| e.to_string())?;
    let summary = tracker.run(&shutdown).map_err(|e| e.to_string())?;

    println!("{summary}");
    Ok(())
}

fn cmd_trips(storage: &Storage) -> Result<(), String> {
    let ledger = storage
        .load_ledger_or_default()
        .map_err(|e| format!("failed to load ledger: {e}"))?;

    if ledger.is_empty() {
        println!("No trips");
        return Ok(());
    }

    for trip in ledger.trips() {
        println!("{}", format_trip(trip));
    }

    Ok(())
}

fn cmd_drivers(storage: &Storage) -> Result<(), String> {
    let mut drivers = storage
        .load_drivers()
        .map_err(|e| format!("failed to load drivers: {e}"))?;
    let accounting = storage
        .load_accounting()
        .map_err(|e| format!("failed to load accounting: {e}"))?;
    accounting.apply_to(&mut drivers);

    // Usage can outlive a registry entry; show it rather than hide liters.
    for (id, liters) in &accounting.usage {
        if !drivers.iter().any(|d| d.driver_id == *id) {
            drivers.push(unregistered(id, *liters));
        }
    }

    if drivers.is_empty() {
        println!("No drivers");
        return Ok(());
    }

    for d in &drivers {
        println!(
            "{:<16} {:>10.3} L  {}",
            d.driver_id, d.fuel_usage_liters, d.display_name
        );
    }

    Ok(())
}

fn unregistered(id: &DriverId, liters: f64) -> Driver {
    Driver {
        driver_id: id.clone(),
        display_name: "(unregistered)".to_string(),
        fuel_usage_liters: liters,
    }
}

fn cmd_refills(storage: &Storage) -> Result<(), String> {
    let refills = storage
        .load_refills()
        .map_err(|e| format!("failed to load refills: {e}"))?;

    if refills.is_empty() {
        println!("No refills");
        return Ok(());
    }

    for event in &refills {
        println!("{}", format_refill(event));
    }

    Ok(())
}

fn cmd_failures(storage: &Storage) -> Result<(), String> {
    let records = storage
        .failure_log()
        .load()
        .map_err(|e| format!("failed to load failures: {e}"))?;

    if records.is_empty() {
        println!("No failures");
        return Ok(());
    }

    for record in &records {
        println!("{}", format_failure(record));
    }

    Ok(())
}
