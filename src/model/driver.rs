//! Driver types: identity and attributed fuel usage.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A driver reference. Trips hold it as a foreign key into the registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverId(String);

impl DriverId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks that `id` can be stored in the refill log's packed burn field.
    pub fn check(id: &str) -> Result<(), String> {
        if id.is_empty() {
            return Err("driver id must not be empty".to_string());
        }
        if id.chars().any(|c| c == ';' || c == '=' || c.is_control()) {
            return Err(format!(
                "driver id '{}' must not contain ';', '=' or control characters",
                id.escape_debug()
            ));
        }
        Ok(())
    }
}

impl From<&str> for DriverId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DriverId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered driver.
#[derive(Debug, Clone, PartialEq)]
pub struct Driver {
    pub driver_id: DriverId,
    pub display_name: String,

    /// Liters attributed at refill closures.
    pub fuel_usage_liters: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_check_rejects_packing_separators() {
        assert!(DriverId::check("alice").is_ok());
        assert!(DriverId::check("o'brien jr.").is_ok());

        assert!(DriverId::check("").is_err());
        assert!(DriverId::check("a=b").is_err());
        assert!(DriverId::check("tab\there").is_err());

        let err = DriverId::check("smith;jr").unwrap_err();
        assert!(err.contains("'smith;jr'"));
    }
}
