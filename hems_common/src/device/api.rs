//! Device capability traits and error types.
//!
//! This module defines:
//! - `DeviceError` enum - Errors reported by factories and device handles
//! - `Capabilities` trait - Conformance queries for optional capabilities
//! - `Meter`, `MeterEnergy`, `Battery` - Measurement capabilities
//! - `Charger`, `Vehicle` - Class-level device traits
//!
//! Every class trait has `Capabilities` as supertrait, so a probe can ask
//! any handle which measurements it supports without knowing its class.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors reported by device factories and device handles.
///
/// `Clone` so a placeholder handle can replay the construction error on
/// every call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceError {
    /// The configuration itself is invalid (unknown type, bad option).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Device communication failed.
    #[error("communication error: {0}")]
    Communication(String),

    /// Construction or call did not complete in time.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// The requested value is not available from this device.
    #[error("not available: {0}")]
    NotAvailable(String),
}

impl DeviceError {
    /// True for configuration validation errors.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Enumerable measurement capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Instantaneous power via [`Meter`].
    CurrentPower,
    /// Cumulative energy via [`MeterEnergy`].
    TotalEnergy,
    /// State of charge via [`Battery`].
    Soc,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CurrentPower => "CurrentPower",
            Self::TotalEnergy => "TotalEnergy",
            Self::Soc => "Soc",
        };
        f.write_str(s)
    }
}

/// Conformance queries for optional capabilities.
///
/// Implementations return `Some(self)` for each capability trait they
/// implement. The defaults report nothing.
pub trait Capabilities {
    /// Instantaneous power capability.
    fn as_meter(&self) -> Option<&dyn Meter> {
        None
    }

    /// Cumulative energy capability.
    fn as_meter_energy(&self) -> Option<&dyn MeterEnergy> {
        None
    }

    /// State of charge capability.
    fn as_battery(&self) -> Option<&dyn Battery> {
        None
    }
}

/// Reports instantaneous power.
pub trait Meter: Capabilities + Send + Sync {
    /// Current power in W. Positive values are import/consumption.
    fn current_power(&self) -> Result<f64, DeviceError>;
}

/// Reports cumulative energy.
pub trait MeterEnergy: Send + Sync {
    /// Total energy in kWh.
    fn total_energy(&self) -> Result<f64, DeviceError>;
}

/// Reports state of charge.
pub trait Battery: Send + Sync {
    /// State of charge in %.
    fn soc(&self) -> Result<f64, DeviceError>;
}

/// IEC 61851 charge status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeStatus {
    /// No vehicle connected.
    A,
    /// Vehicle connected, not charging.
    B,
    /// Charging.
    C,
    /// Charging with ventilation.
    D,
    /// No power.
    E,
    /// Error.
    F,
}

impl ChargeStatus {
    /// Parse a single-letter status.
    pub fn parse(s: &str) -> Result<Self, DeviceError> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            "E" => Ok(Self::E),
            "F" => Ok(Self::F),
            _ => Err(DeviceError::Config(format!("invalid status: {s}"))),
        }
    }
}

/// Wallbox control.
pub trait Charger: Capabilities + Send + Sync {
    /// Current charge status.
    fn status(&self) -> Result<ChargeStatus, DeviceError>;

    /// Whether charging is enabled.
    fn enabled(&self) -> Result<bool, DeviceError>;

    /// Enable or disable charging.
    fn enable(&self, enable: bool) -> Result<(), DeviceError>;

    /// Set the maximum charge current in A.
    fn max_current(&self, current: i64) -> Result<(), DeviceError>;
}

/// Electric vehicle.
pub trait Vehicle: Capabilities + Battery {
    /// Display title. Empty if the implementation does not provide one.
    fn title(&self) -> String;

    /// Override the display title.
    fn set_title(&mut self, title: String);

    /// Battery capacity in kWh.
    fn capacity(&self) -> f64;

    /// Construction error of a placeholder handle.
    ///
    /// `None` for working vehicles.
    fn construction_error(&self) -> Option<&DeviceError> {
        None
    }
}
