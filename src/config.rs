//! Credential store configuration, read from TOML.
//!
//! ```toml
//! capacity = 101
//! salt = "$1$########"
//! ```
//!
//! Both keys are optional and fall back to the built-in defaults.

use crate::error::ConfigError;
use crate::prime::DEFAULT_CAPACITY;
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_SALT: &str = "$1$########";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Requested bucket count; rounded down to a prime.
    pub capacity: usize,
    /// Salt mixed into every stored credential.
    pub salt: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            salt: DEFAULT_SALT.into(),
        }
    }
}

impl StoreConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }
}
