//! Runtime configuration.
//!
//! Every key is optional; a missing key falls back to [`ServiceConfig::default`].
//!
//! ```toml
//! database_path = "/var/lib/hospital/records.db"
//! patient_number_prefix = "PCC"
//! min_phone_digits = 10
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Settings for the data-access layer.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// SQLite file; `None` means in-memory
    pub database_path: Option<PathBuf>,
    /// Leading segment of generated patient numbers
    pub patient_number_prefix: String,
    /// Leading segment of generated bill numbers
    pub bill_number_prefix: String,
    /// Minimum count of digits in a phone number
    pub min_phone_digits: usize,
    /// Candidates tried before identifier generation gives up
    pub max_identifier_attempts: u32,
    /// Jaro-Winkler similarity needed for a fuzzy name hit
    pub fuzzy_match_threshold: f64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            patient_number_prefix: "PAT".into(),
            bill_number_prefix: "BILL".into(),
            min_phone_digits: 9,
            max_identifier_attempts: 5,
            fuzzy_match_threshold: 0.85,
        }
    }
}

impl ServiceConfig {
    /// Parse and check a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        log::info!("Loaded service config from {:?}", path);
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, prefix) in [
            ("patient_number_prefix", &self.patient_number_prefix),
            ("bill_number_prefix", &self.bill_number_prefix),
        ] {
            if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("'{}' must be non-empty ASCII alphanumeric", prefix),
                });
            }
        }
        if self.max_identifier_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "max_identifier_attempts",
                reason: "must be at least 1".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.fuzzy_match_threshold) {
            return Err(ConfigError::Invalid {
                key: "fuzzy_match_threshold",
                reason: format!("{} is outside 0.0..=1.0", self.fuzzy_match_threshold),
            });
        }
        Ok(())
    }
}
