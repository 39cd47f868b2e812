//! Fueltrack configuration.
//!
//! Loaded from `~/.fueltrack/config.toml` unless `--config` names another
//! file. Every key is optional:
//!
//! ```toml
//! data-dir = "/var/lib/fueltrack"
//! default-driver = "alice"
//! poll-interval-ms = 50
//! checkpoint-interval-secs = 15
//! connect-timeout-secs = 30
//! connect-retry-ms = 1000
//! fuel-level-wait-secs = 5
//! refill-threshold-percent = 5.0
//! log-filter = "info"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use jiff::SignedDuration;
use serde::Deserialize;

use crate::{refill::DEFAULT_THRESHOLD_PERCENT, retry::RetryPolicy, tracker::TrackerSettings};

/// Upper bound for the millisecond keys: one minute.
const MAX_INTERVAL_MS: u64 = 60_000;

/// Upper bound for the second keys: one day.
const MAX_INTERVAL_SECS: u64 = 86_400;

/// Fueltrack configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Where the ledger and logs live. Defaults to `~/.fueltrack/data`.
    pub data_dir: Option<PathBuf>,

    /// Driver used when neither `--driver` nor `FUELTRACK_DRIVER` is set.
    pub default_driver: Option<String>,

    pub poll_interval_ms: u64,
    pub checkpoint_interval_secs: u64,
    pub connect_timeout_secs: u64,
    pub connect_retry_ms: u64,

    /// How long to wait for a fuel level reading when a trip opens.
    pub fuel_level_wait_secs: u64,

    /// Rise in fuel level, in percentage points, above which a refill is declared.
    pub refill_threshold_percent: f64,

    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            default_driver: None,
            poll_interval_ms: 50,
            checkpoint_interval_secs: 15,
            connect_timeout_secs: 30,
            connect_retry_ms: 1000,
            fuel_level_wait_secs: 5,
            refill_threshold_percent: DEFAULT_THRESHOLD_PERCENT,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Load config from `explicit`, or from `~/.fueltrack/config.toml`.
    ///
    /// A missing default file yields the defaults. A missing explicit file,
    /// an unreadable file, or invalid contents are errors.
    pub fn load(explicit: Option<&Path>) -> Result<Self, String> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound && explicit.is_none() => {
                return Ok(Self::default());
            }
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        Self::parse(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(contents).map_err(|e| e.to_string())?;
        for (key, value) in [
            ("poll-interval-ms", config.poll_interval_ms),
            ("connect-retry-ms", config.connect_retry_ms),
        ] {
            if value == 0 {
                return Err(format!("{key} must be positive"));
            }
            if value > MAX_INTERVAL_MS {
                return Err(format!("{key} must be at most {MAX_INTERVAL_MS}"));
            }
        }
        for (key, value) in [
            ("checkpoint-interval-secs", config.checkpoint_interval_secs),
            ("connect-timeout-secs", config.connect_timeout_secs),
            ("fuel-level-wait-secs", config.fuel_level_wait_secs),
        ] {
            if value > MAX_INTERVAL_SECS {
                return Err(format!("{key} must be at most {MAX_INTERVAL_SECS}"));
            }
        }
        if !config.refill_threshold_percent.is_finite() || config.refill_threshold_percent < 0.0 {
            return Err("refill-threshold-percent must be a non-negative number".to_string());
        }
        Ok(config)
    }

    /// The config file path: `~/.fueltrack/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".fueltrack").join("config.toml"))
    }

    /// Retry schedule for establishing the gateway session.
    pub fn connect_policy(&self) -> RetryPolicy {
        RetryPolicy {
            interval: millis(self.connect_retry_ms),
            timeout: secs(self.connect_timeout_secs),
        }
    }

    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            poll_interval: millis(self.poll_interval_ms),
            checkpoint_interval: secs(self.checkpoint_interval_secs),
            fuel_level_wait: RetryPolicy {
                interval: millis(self.connect_retry_ms),
                timeout: secs(self.fuel_level_wait_secs),
            },
            refill_threshold_percent: self.refill_threshold_percent,
        }
    }
}

fn millis(value: u64) -> SignedDuration {
    SignedDuration::from_millis(i64::try_from(value).unwrap_or(i64::MAX))
}

fn secs(value: u64) -> SignedDuration {
    SignedDuration::from_secs(i64::try_from(value).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn keys_are_kebab_case() {
        let config = Config::parse(
            r#"
            data-dir = "/tmp/fuel"
            default-driver = "alice"
            poll-interval-ms = 100
            checkpoint-interval-secs = 30
            refill-threshold-percent = 7.5
            log-filter = "fueltrack=debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/fuel")));
        assert_eq!(config.default_driver.as_deref(), Some("alice"));
        assert_eq!(config.poll_interval_ms, 100);
        assert_eq!(config.checkpoint_interval_secs, 30);
        assert_eq!(config.connect_timeout_secs, 30);
        assert_eq!(config.refill_threshold_percent, 7.5);
        assert_eq!(config.log_filter, "fueltrack=debug");
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(Config::parse("poll-interval = 5").is_err());
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        assert!(Config::parse("poll-interval-ms = 0").is_err());
    }

    #[test]
    fn oversized_intervals_are_rejected() {
        let err = Config::parse("checkpoint-interval-secs = 400000000000").unwrap_err();
        assert_eq!(err, "checkpoint-interval-secs must be at most 86400");

        let err = Config::parse("poll-interval-ms = 60001").unwrap_err();
        assert_eq!(err, "poll-interval-ms must be at most 60000");

        assert!(Config::parse("connect-timeout-secs = 86401").is_err());

        let config =
            Config::parse("checkpoint-interval-secs = 86400\npoll-interval-ms = 60000").unwrap();
        assert_eq!(
            config.tracker_settings().checkpoint_interval,
            SignedDuration::from_secs(86_400)
        );
    }

    #[test]
    fn settings_use_configured_durations() {
        let config = Config::default();

        let policy = config.connect_policy();
        assert_eq!(policy.interval, SignedDuration::from_secs(1));
        assert_eq!(policy.timeout, SignedDuration::from_secs(30));

        let settings = config.tracker_settings();
        assert_eq!(settings.poll_interval, SignedDuration::from_millis(50));
        assert_eq!(settings.checkpoint_interval, SignedDuration::from_secs(15));
        assert_eq!(settings.fuel_level_wait.timeout, SignedDuration::from_secs(5));
        assert_eq!(settings.refill_threshold_percent, 5.0);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.contains("failed to read"));
    }

    #[test]
    fn explicit_file_is_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "connect-timeout-secs = 3\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.connect_timeout_secs, 3);
    }
}
