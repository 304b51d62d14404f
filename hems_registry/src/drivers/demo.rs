//! Demo driver implementation.
//!
//! Software devices reporting values taken from their options. Every demo
//! device accepts two simulation options:
//!
//! - `delay` - construction delay in ms, standing in for a device probe
//! - `offline` - fail construction with a communication error

use futures::future::BoxFuture;
use hems_common::device::{
    Battery, Capabilities, ChargeStatus, Charger, DeviceError, Meter, MeterEnergy, Options,
    Vehicle,
};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

/// Default maximum charge current in A.
const DEFAULT_MAX_CURRENT: i64 = 16;

// ─── Option helpers ─────────────────────────────────────────────────

/// Read a finite numeric option given as number or numeric string.
fn option_f64(options: &Options, key: &str) -> Result<Option<f64>, DeviceError> {
    let value = match options.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| DeviceError::Config(format!("{key}: invalid number"))),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| DeviceError::Config(format!("{key}: invalid number '{s}'"))),
        Some(other) => Err(DeviceError::Config(format!("{key}: invalid number {other}"))),
    }?;

    match value {
        Some(v) if !v.is_finite() => {
            Err(DeviceError::Config(format!("{key}: not a finite number: {v}")))
        }
        _ => Ok(value),
    }
}

fn option_bool(options: &Options, key: &str) -> Result<Option<bool>, DeviceError> {
    match options.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Bool(b)) => Ok(Some(*b)),
        Some(serde_json::Value::String(s)) => s
            .parse::<bool>()
            .map(Some)
            .map_err(|_| DeviceError::Config(format!("{key}: invalid bool '{s}'"))),
        Some(other) => Err(DeviceError::Config(format!("{key}: invalid bool {other}"))),
    }
}

fn option_str<'a>(options: &'a Options, key: &str) -> Option<&'a str> {
    options.get(key).and_then(|v| v.as_str())
}

/// Apply the `delay` and `offline` simulation options.
async fn simulate_probe(options: &Options) -> Result<(), DeviceError> {
    if let Some(delay) = option_f64(options, "delay")? {
        if delay > 0.0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }
    }

    if option_bool(options, "offline")?.unwrap_or(false) {
        return Err(DeviceError::Communication("device offline".to_string()));
    }

    Ok(())
}

// ─── Meter ──────────────────────────────────────────────────────────

/// Meter with fixed readings.
#[derive(Debug)]
pub struct DemoMeter {
    power: f64,
    energy: Option<f64>,
    soc: Option<f64>,
}

impl DemoMeter {
    /// Build from options: `power` (required), `energy`, `soc`.
    pub fn from_options(options: &Options) -> Result<Self, DeviceError> {
        let power = option_f64(options, "power")?
            .ok_or_else(|| DeviceError::Config("power: missing".to_string()))?;

        Ok(Self {
            power,
            energy: option_f64(options, "energy")?,
            soc: option_f64(options, "soc")?,
        })
    }
}

impl Capabilities for DemoMeter {
    fn as_meter(&self) -> Option<&dyn Meter> {
        Some(self)
    }

    fn as_meter_energy(&self) -> Option<&dyn MeterEnergy> {
        self.energy.map(|_| self as &dyn MeterEnergy)
    }

    fn as_battery(&self) -> Option<&dyn Battery> {
        self.soc.map(|_| self as &dyn Battery)
    }
}

impl Meter for DemoMeter {
    fn current_power(&self) -> Result<f64, DeviceError> {
        Ok(self.power)
    }
}

impl MeterEnergy for DemoMeter {
    fn total_energy(&self) -> Result<f64, DeviceError> {
        self.energy
            .ok_or_else(|| DeviceError::NotAvailable("energy".to_string()))
    }
}

impl Battery for DemoMeter {
    fn soc(&self) -> Result<f64, DeviceError> {
        self.soc
            .ok_or_else(|| DeviceError::NotAvailable("soc".to_string()))
    }
}

/// Constructor for demo meters.
pub fn create_meter(options: Options) -> BoxFuture<'static, Result<Box<dyn Meter>, DeviceError>> {
    Box::pin(async move {
        let meter = DemoMeter::from_options(&options)?;
        simulate_probe(&options).await?;
        Ok(Box::new(meter) as Box<dyn Meter>)
    })
}

// ─── Charger ────────────────────────────────────────────────────────

/// Charger keeping its control state in memory.
#[derive(Debug)]
pub struct DemoCharger {
    status: ChargeStatus,
    enabled: AtomicBool,
    max_current: AtomicI64,
}

impl DemoCharger {
    /// Build from options: `status`, `enabled`, `maxcurrent`.
    pub fn from_options(options: &Options) -> Result<Self, DeviceError> {
        let status = match option_str(options, "status") {
            Some(s) => ChargeStatus::parse(s)?,
            None => ChargeStatus::A,
        };

        let max_current = match option_f64(options, "maxcurrent")? {
            Some(current) if current <= 0.0 => {
                return Err(DeviceError::Config(format!(
                    "maxcurrent: must be positive, got {current}"
                )));
            }
            Some(current) => current as i64,
            None => DEFAULT_MAX_CURRENT,
        };

        Ok(Self {
            status,
            enabled: AtomicBool::new(option_bool(options, "enabled")?.unwrap_or(false)),
            max_current: AtomicI64::new(max_current),
        })
    }

    /// Current limit last set.
    pub fn current_limit(&self) -> i64 {
        self.max_current.load(Ordering::SeqCst)
    }
}

impl Capabilities for DemoCharger {}

impl Charger for DemoCharger {
    fn status(&self) -> Result<ChargeStatus, DeviceError> {
        Ok(self.status)
    }

    fn enabled(&self) -> Result<bool, DeviceError> {
        Ok(self.enabled.load(Ordering::SeqCst))
    }

    fn enable(&self, enable: bool) -> Result<(), DeviceError> {
        self.enabled.store(enable, Ordering::SeqCst);
        Ok(())
    }

    fn max_current(&self, current: i64) -> Result<(), DeviceError> {
        if current <= 0 {
            return Err(DeviceError::Config(format!(
                "max current must be positive, got {current}"
            )));
        }
        self.max_current.store(current, Ordering::SeqCst);
        Ok(())
    }
}

/// Constructor for demo chargers.
pub fn create_charger(
    options: Options,
) -> BoxFuture<'static, Result<Box<dyn Charger>, DeviceError>> {
    Box::pin(async move {
        let charger = DemoCharger::from_options(&options)?;
        simulate_probe(&options).await?;
        Ok(Box::new(charger) as Box<dyn Charger>)
    })
}

// ─── Vehicle ────────────────────────────────────────────────────────

/// Vehicle with fixed battery data.
#[derive(Debug)]
pub struct DemoVehicle {
    title: String,
    capacity: f64,
    soc: f64,
}

impl DemoVehicle {
    /// Build from options: `title`, `capacity`, `soc`.
    pub fn from_options(options: &Options) -> Result<Self, DeviceError> {
        let soc = option_f64(options, "soc")?.unwrap_or(0.0);
        if !(0.0..=100.0).contains(&soc) {
            return Err(DeviceError::Config(format!("soc: out of range: {soc}")));
        }

        Ok(Self {
            title: option_str(options, "title").unwrap_or_default().to_string(),
            capacity: option_f64(options, "capacity")?.unwrap_or(0.0),
            soc,
        })
    }
}

impl Capabilities for DemoVehicle {
    fn as_battery(&self) -> Option<&dyn Battery> {
        Some(self)
    }
}

impl Battery for DemoVehicle {
    fn soc(&self) -> Result<f64, DeviceError> {
        Ok(self.soc)
    }
}

impl Vehicle for DemoVehicle {
    fn title(&self) -> String {
        self.title.clone()
    }

    fn set_title(&mut self, title: String) {
        self.title = title;
    }

    fn capacity(&self) -> f64 {
        self.capacity
    }
}

/// Constructor for demo vehicles.
pub fn create_vehicle(
    options: Options,
) -> BoxFuture<'static, Result<Box<dyn Vehicle>, DeviceError>> {
    Box::pin(async move {
        let vehicle = DemoVehicle::from_options(&options)?;
        simulate_probe(&options).await?;
        Ok(Box::new(vehicle) as Box<dyn Vehicle>)
    })
}
