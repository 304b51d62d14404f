//! Built-in device drivers.
//!
//! - [`demo`] - Software devices with fixed readings for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the class trait (`Meter`, `Charger` or `Vehicle`) and `Capabilities`
//! 3. Provide a `Constructor` function per class and register it below

pub mod demo;

use hems_common::device::{Charger, Meter, Vehicle};

use crate::factory::FactoryRegistry;

/// Register all built-in drivers.
pub fn register_all_drivers(
    meters: &mut FactoryRegistry<dyn Meter>,
    chargers: &mut FactoryRegistry<dyn Charger>,
    vehicles: &mut FactoryRegistry<dyn Vehicle>,
) {
    meters.register("demo", demo::create_meter);
    meters.register("default", demo::create_meter);
    chargers.register("demo", demo::create_charger);
    vehicles.register("demo", demo::create_vehicle);
}
