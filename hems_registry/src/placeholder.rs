//! Placeholder for vehicles that failed to construct.
//!
//! Substituted by the configurator when a vehicle fails for a reason other
//! than invalid configuration, so the platform keeps running with the
//! vehicle degraded. Every capability call replays the construction error.

use hems_common::device::{Battery, Capabilities, DeviceError, Vehicle};

/// Vehicle handle reporting its construction error.
#[derive(Debug)]
pub struct PlaceholderVehicle {
    err: DeviceError,
    title: String,
}

impl PlaceholderVehicle {
    /// Wrap a construction error.
    pub fn new(err: DeviceError) -> Self {
        Self {
            err,
            title: String::new(),
        }
    }
}

impl Capabilities for PlaceholderVehicle {
    fn as_battery(&self) -> Option<&dyn Battery> {
        Some(self)
    }
}

impl Battery for PlaceholderVehicle {
    fn soc(&self) -> Result<f64, DeviceError> {
        Err(self.err.clone())
    }
}

impl Vehicle for PlaceholderVehicle {
    fn title(&self) -> String {
        self.title.clone()
    }

    fn set_title(&mut self, title: String) {
        self.title = title;
    }

    fn capacity(&self) -> f64 {
        0.0
    }

    fn construction_error(&self) -> Option<&DeviceError> {
        Some(&self.err)
    }
}
