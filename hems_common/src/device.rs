//! Device model shared between the registry and its consumers.
//!
//! This module contains:
//! - [`Class`] - The device classes (meter, charger, vehicle)
//! - [`Named`] / [`Typed`] - Declarative configuration records
//! - [`api`] - Capability traits implemented by device handles

pub mod api;
pub mod class;
pub mod named;

pub use api::{
    Battery, Capabilities, Capability, ChargeStatus, Charger, DeviceError, Meter, MeterEnergy,
    Vehicle,
};
pub use class::Class;
pub use named::{Named, Options, TEMPLATE_TYPE, Typed, name_for_id};
