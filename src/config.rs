// CLASSIFICATION: COMMUNITY
// Filename: config.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-15

//! Queen configuration.
//!
//! Values come from [`Default`], the environment (`HIVEQUEEN_*`) or a TOML
//! document. Unparseable values are errors rather than silent fallbacks.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::workforce::PopulationStrategy;

pub const ENV_REGISTRATION_TIMEOUT_MS: &str = "HIVEQUEEN_REGISTRATION_TIMEOUT_MS";
pub const ENV_DEFAULT_POPULATION: &str = "HIVEQUEEN_DEFAULT_POPULATION";
pub const ENV_BASE_PATH: &str = "HIVEQUEEN_BASE_PATH";

/// Default time a connection gets to register.
pub const DEFAULT_REGISTRATION_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Runtime configuration for a [`crate::Queen`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueenConfig {
    /// Time an unregistered connection may stay connected.
    pub registration_timeout: Duration,
    /// Strategy for workforces created without an explicit `populate`.
    pub default_population: PopulationStrategy,
    /// Mount path for the HTTP surface. Not used by the core.
    pub base_path: String,
}

impl Default for QueenConfig {
    fn default() -> Self {
        Self {
            registration_timeout: DEFAULT_REGISTRATION_TIMEOUT,
            default_population: PopulationStrategy::Once,
            base_path: String::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    registration_timeout_ms: Option<u64>,
    default_population: Option<PopulationStrategy>,
    base_path: Option<String>,
}

impl QueenConfig {
    /// Defaults overridden by any `HIVEQUEEN_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env()
    }

    /// Apply `HIVEQUEEN_*` overrides on top of `self`.
    pub fn with_env(mut self) -> Result<Self, ConfigError> {
        if let Some(ms) = parse_env::<u64>(ENV_REGISTRATION_TIMEOUT_MS)? {
            self.registration_timeout = Duration::from_millis(ms);
        }
        if let Some(strategy) = parse_env::<PopulationStrategy>(ENV_DEFAULT_POPULATION)? {
            self.default_population = strategy;
        }
        if let Ok(path) = env::var(ENV_BASE_PATH) {
            self.base_path = path;
        }
        Ok(self)
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;
        let mut config = Self::default();
        if let Some(ms) = file.registration_timeout_ms {
            config.registration_timeout = Duration::from_millis(ms);
        }
        if let Some(strategy) = file.default_population {
            config.default_population = strategy;
        }
        if let Some(path) = file.base_path {
            config.base_path = path;
        }
        Ok(config)
    }
}

fn parse_env<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_overrides_only_given_keys() {
        let cfg = QueenConfig::from_toml_str(
            "registration_timeout_ms = 250\ndefault_population = \"continuous\"\n",
        )
        .unwrap();
        assert_eq!(cfg.registration_timeout, Duration::from_millis(250));
        assert_eq!(cfg.default_population, PopulationStrategy::Continuous);
        assert_eq!(cfg.base_path, "");
    }

    #[test]
    fn toml_rejects_bad_values() {
        assert!(matches!(
            QueenConfig::from_toml_str("default_population = \"sometimes\""),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            QueenConfig::from_toml_str("registration_timeout = 5"),
            Err(ConfigError::Toml(_))
        ));
    }
}
