//! Prelude module for common re-exports.
//!
//! ```rust
//! use hems_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, HemsConfig, LogLevel, SharedConfig};

// ─── Device model ───────────────────────────────────────────────────
pub use crate::device::{
    Battery, Capabilities, Capability, ChargeStatus, Charger, Class, DeviceError, Meter,
    MeterEnergy, Named, Options, Typed, Vehicle,
};
