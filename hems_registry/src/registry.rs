//! Device registry facade.
//!
//! `DeviceRegistry` composes the meter, charger and vehicle class registries
//! behind class-specific operations. It is constructed once at startup and
//! shared by `Arc` with every consumer; there is no global instance.

use hems_common::config::HemsConfig;
use hems_common::device::{Charger, Class, Meter, Named, Vehicle};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::class_registry::ClassRegistry;
use crate::configure::{configure_concurrent, configure_sequential, finish_vehicle, passthrough};
use crate::error::RegistryError;
use crate::factory::{DeviceFactory, Factories};

/// Registry of all configured devices.
pub struct DeviceRegistry {
    meters: ClassRegistry<dyn Meter>,
    chargers: ClassRegistry<dyn Charger>,
    vehicles: ClassRegistry<dyn Vehicle>,
    /// Deadline for a single factory call during configure.
    construct_timeout: Option<Duration>,
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            meters: ClassRegistry::new(Class::Meter),
            chargers: ClassRegistry::new(Class::Charger),
            vehicles: ClassRegistry::new(Class::Vehicle),
            construct_timeout: None,
        }
    }

    /// Bound every factory call made by `configure_*` to `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.construct_timeout = timeout;
        self
    }

    /// Start a new duplicate-usage tracking pass for all classes.
    pub fn track_visitors(&self) {
        self.meters.track_visitors();
        self.chargers.track_visitors();
        self.vehicles.track_visitors();
    }

    /// Configuration records of a class.
    pub fn config(&self, class: Class) -> Vec<Named> {
        match class {
            Class::Meter => self.meters.config(),
            Class::Charger => self.chargers.config(),
            Class::Vehicle => self.vehicles.config(),
        }
    }

    /// True if a device of the class carries the name.
    pub fn contains(&self, class: Class, name: &str) -> bool {
        match class {
            Class::Meter => self.meters.contains(name),
            Class::Charger => self.chargers.contains(name),
            Class::Vehicle => self.vehicles.contains(name),
        }
    }

    /// Configure all classes from a config file.
    ///
    /// Classes are configured concurrently. Each class is replaced
    /// all-or-nothing; a failing class does not roll back the others.
    pub async fn configure(
        &self,
        conf: &HemsConfig,
        factories: &Factories,
    ) -> Result<(), RegistryError> {
        tokio::try_join!(
            self.configure_meters(&conf.meters, factories.meter.as_ref()),
            self.configure_chargers(&conf.chargers, Arc::clone(&factories.charger)),
            self.configure_vehicles(&conf.vehicles, Arc::clone(&factories.vehicle)),
        )?;
        Ok(())
    }

    // ─── Meters ─────────────────────────────────────────────────────

    /// Meter by name.
    pub fn meter(&self, name: &str) -> Result<Arc<dyn Meter>, RegistryError> {
        self.meters.by_name(name)
    }

    /// All meters by name.
    pub fn meters(&self) -> HashMap<String, Arc<dyn Meter>> {
        self.meters.devices()
    }

    /// Meter configuration records.
    pub fn meters_config(&self) -> Vec<Named> {
        self.meters.config()
    }

    /// Add a single meter.
    pub fn add_meter(&self, config: Named, meter: Arc<dyn Meter>) -> Result<(), RegistryError> {
        self.meters.add(config, meter)
    }

    /// Replace all meters. Meters are constructed sequentially.
    pub async fn configure_meters(
        &self,
        conf: &[Named],
        factory: &dyn DeviceFactory<dyn Meter>,
    ) -> Result<(), RegistryError> {
        let entries = configure_sequential(
            Class::Meter,
            conf,
            factory,
            self.construct_timeout,
            passthrough,
        )
        .await?;

        info!("configured {} meters", entries.len());
        self.meters.replace(entries);
        Ok(())
    }

    // ─── Chargers ───────────────────────────────────────────────────

    /// Charger by name.
    pub fn charger(&self, name: &str) -> Result<Arc<dyn Charger>, RegistryError> {
        self.chargers.by_name(name)
    }

    /// All chargers by name.
    pub fn chargers(&self) -> HashMap<String, Arc<dyn Charger>> {
        self.chargers.devices()
    }

    /// Charger configuration records.
    pub fn chargers_config(&self) -> Vec<Named> {
        self.chargers.config()
    }

    /// Add a single charger.
    pub fn add_charger(
        &self,
        config: Named,
        charger: Arc<dyn Charger>,
    ) -> Result<(), RegistryError> {
        self.chargers.add(config, charger)
    }

    /// Replace all chargers. Chargers are constructed concurrently.
    pub async fn configure_chargers(
        &self,
        conf: &[Named],
        factory: Arc<dyn DeviceFactory<dyn Charger>>,
    ) -> Result<(), RegistryError> {
        let entries = configure_concurrent(
            Class::Charger,
            conf,
            factory,
            self.construct_timeout,
            passthrough,
        )
        .await?;

        info!("configured {} chargers", entries.len());
        self.chargers.replace(entries);
        Ok(())
    }

    // ─── Vehicles ───────────────────────────────────────────────────

    /// Vehicle by name.
    pub fn vehicle(&self, name: &str) -> Result<Arc<dyn Vehicle>, RegistryError> {
        self.vehicles.by_name(name)
    }

    /// All vehicles by name.
    pub fn vehicles(&self) -> HashMap<String, Arc<dyn Vehicle>> {
        self.vehicles.devices()
    }

    /// Vehicle configuration records.
    pub fn vehicles_config(&self) -> Vec<Named> {
        self.vehicles.config()
    }

    /// Add a single vehicle.
    pub fn add_vehicle(
        &self,
        config: Named,
        vehicle: Arc<dyn Vehicle>,
    ) -> Result<(), RegistryError> {
        self.vehicles.add(config, vehicle)
    }

    /// Vehicle class registry.
    pub fn vehicle_registry(&self) -> &ClassRegistry<dyn Vehicle> {
        &self.vehicles
    }

    /// Replace all vehicles. Vehicles are constructed concurrently.
    ///
    /// Vehicles failing for reasons other than invalid configuration are
    /// kept as degraded placeholders, see [`DeviceRegistry::degraded_vehicles`].
    pub async fn configure_vehicles(
        &self,
        conf: &[Named],
        factory: Arc<dyn DeviceFactory<dyn Vehicle>>,
    ) -> Result<(), RegistryError> {
        let entries = configure_concurrent(
            Class::Vehicle,
            conf,
            factory,
            self.construct_timeout,
            finish_vehicle,
        )
        .await?;

        info!("configured {} vehicles", entries.len());
        self.vehicles.replace(entries);
        Ok(())
    }

    /// Names of vehicles running as placeholders, sorted.
    pub fn degraded_vehicles(&self) -> Vec<String> {
        let mut res: Vec<String> = self
            .vehicles
            .devices()
            .into_iter()
            .filter(|(_, v)| v.construction_error().is_some())
            .map(|(name, _)| name)
            .collect();
        res.sort();
        res
    }
}
