//! Capability probing.
//!
//! Reads every measurement a device supports, reporting each as an
//! independent value-or-error pair. Used to test a configuration before it
//! is stored and by the CLI to dump configured devices.

use hems_common::device::{Capabilities, Capability, DeviceError};
use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of one capability read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    /// Value, if the read succeeded.
    pub value: Option<f64>,
    /// Error message, if the read failed.
    pub error: Option<String>,
}

impl From<Result<f64, DeviceError>> for ProbeResult {
    fn from(res: Result<f64, DeviceError>) -> Self {
        match res {
            Ok(value) => Self {
                value: Some(value),
                error: None,
            },
            Err(err) => Self {
                value: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Probe results by capability.
pub type ProbeReport = BTreeMap<Capability, ProbeResult>;

/// Capabilities a device supports.
pub fn capabilities<D: Capabilities + ?Sized>(device: &D) -> Vec<Capability> {
    let mut res = Vec::new();
    if device.as_meter().is_some() {
        res.push(Capability::CurrentPower);
    }
    if device.as_meter_energy().is_some() {
        res.push(Capability::TotalEnergy);
    }
    if device.as_battery().is_some() {
        res.push(Capability::Soc);
    }
    res
}

/// Read every supported capability.
pub fn probe<D: Capabilities + ?Sized>(device: &D) -> ProbeReport {
    let mut res = ProbeReport::new();

    if let Some(meter) = device.as_meter() {
        res.insert(Capability::CurrentPower, meter.current_power().into());
    }
    if let Some(meter) = device.as_meter_energy() {
        res.insert(Capability::TotalEnergy, meter.total_energy().into());
    }
    if let Some(battery) = device.as_battery() {
        res.insert(Capability::Soc, battery.soc().into());
    }

    res
}
