//! Driver resolution for a tracking run.
//!
//! Every trip is attributed to one driver. Rather than requiring `--driver`
//! on every invocation, the driver is resolved through a chain:
//!
//! 1. `--driver <id>` explicit per-run override
//! 2. `FUELTRACK_DRIVER` env var, set once per vehicle session
//! 3. `default-driver` in the config file, for single-driver vehicles
//!
//! When the driver registry lists anyone, the resolved driver must be one of them.
//! Either way the id must pass [`DriverId::check`].

use std::env;

use crate::model::{Driver, DriverId};

/// Env var consulted when no `--driver` is given.
pub const DRIVER_ENV: &str = "FUELTRACK_DRIVER";

/// Error message shown when the driver cannot be resolved.
pub const DRIVER_REQUIRED: &str = "driver required: pass --driver <id>, \
    set FUELTRACK_DRIVER, or add `default-driver = \"...\"` to ~/.fueltrack/config.toml";

/// Resolve the current driver from the tiered resolution chain.
///
/// Checks in order: explicit `--driver` value, `FUELTRACK_DRIVER`, then the
/// configured default. Returns [`DRIVER_REQUIRED`] when none yields a value.
pub fn resolve_driver(explicit: Option<&str>, configured: Option<&str>) -> Result<DriverId, String> {
    let from_env = env::var(DRIVER_ENV).ok();
    pick(explicit, from_env.as_deref(), configured)
}

fn pick(
    explicit: Option<&str>,
    from_env: Option<&str>,
    configured: Option<&str>,
) -> Result<DriverId, String> {
    [explicit, from_env, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|id| !id.is_empty())
        .ok_or_else(|| DRIVER_REQUIRED.to_string())
        .and_then(|id| {
            DriverId::check(id)?;
            Ok(DriverId::from(id))
        })
}

/// Check the driver against the registry. An empty registry accepts anyone.
pub fn check_registered(driver: &DriverId, registry: &[Driver]) -> Result<(), String> {
    if registry.is_empty() || registry.iter().any(|d| d.driver_id == *driver) {
        return Ok(());
    }
    let known: Vec<&str> = registry.iter().map(|d| d.driver_id.as_str()).collect();
    Err(format!(
        "unknown driver '{driver}'; registered drivers: {}",
        known.join(", ")
    ))
}
