//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load the HEMS TOML
//! configuration file: shared service settings plus the declarative
//! device lists for meters, chargers and vehicles.
//!
//! # Usage
//!
//! ```rust,no_run
//! use hems_common::config::{ConfigLoader, ConfigError, HemsConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = HemsConfig::load(Path::new("hems.toml"))?;
//!     config.validate()?;
//!     println!("{} meters configured", config.meters.len());
//!     Ok(())
//! }
//! ```

use crate::device::Named;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "hems"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            service_name: "hems".to_string(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level HEMS configuration file.
///
/// Device lists are declarative; every entry is a [`Named`] record whose
/// extra keys become the options bag handed to the device factory.
///
/// # TOML Example
///
/// ```toml
/// construct_timeout_ms = 5000
///
/// [shared]
/// service_name = "hems"
///
/// [[meters]]
/// name = "grid"
/// type = "demo"
/// power = 1200
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HemsConfig {
    /// Shared service settings.
    #[serde(default)]
    pub shared: SharedConfig,

    /// Deadline for a single device construction in milliseconds.
    /// Omitted means no deadline.
    #[serde(default)]
    pub construct_timeout_ms: Option<u64>,

    /// Meter definitions.
    #[serde(default)]
    pub meters: Vec<Named>,

    /// Charger definitions.
    #[serde(default)]
    pub chargers: Vec<Named>,

    /// Vehicle definitions.
    #[serde(default)]
    pub vehicles: Vec<Named>,
}

impl HemsConfig {
    /// Validate the configuration.
    ///
    /// Device names are not checked here; the registry reports missing and
    /// duplicate names with their class and position.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the shared section is
    /// invalid or `construct_timeout_ms` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        if self.construct_timeout_ms == Some(0) {
            return Err(ConfigError::ValidationError(
                "construct_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Construction deadline, if configured.
    pub fn construct_timeout(&self) -> Option<Duration> {
        self.construct_timeout_ms.map(Duration::from_millis)
    }
}

/// Narrow a device list to the single entry named in `args`.
///
/// With no argument the list is left untouched.
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` if no entry carries the name.
pub fn select_by_name(args: &[String], conf: &mut Vec<Named>) -> Result<(), ConfigError> {
    let [name] = args else {
        return Ok(());
    };

    match conf.iter().find(|c| &c.name == name) {
        Some(selected) => {
            *conf = vec![selected.clone()];
            Ok(())
        }
        None => Err(ConfigError::ValidationError(format!("{name} not found"))),
    }
}

/// Trait for loading configuration from TOML files.
///
/// Blanket-implemented for every `serde::de::DeserializeOwned` type.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
