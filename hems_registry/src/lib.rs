//! # HEMS Device Registry
//!
//! Name-indexed registry of the configured meters, chargers and vehicles of
//! a home energy management system.
//!
//! Devices are described declaratively by [`Named`](hems_common::device::Named)
//! records and built through a [`DeviceFactory`]. A configure pass builds a
//! whole class off-line and swaps it into the live registry in one step, so
//! consumers never observe a half-configured class.
//!
//! # Module Structure
//!
//! - [`class_registry`] - Name-unique store of one device class
//! - [`configure`] - Bulk configurator (sequential and concurrent)
//! - [`registry`] - `DeviceRegistry` facade over all classes
//! - [`factory`] - Factory boundary and constructor table
//! - [`drivers`] - Built-in device drivers
//! - [`placeholder`] - Degraded stand-in for failed vehicles
//! - [`probe`] - Capability probing
//! - [`store`] - Persisted runtime-created devices
//! - [`service`] - Device management operations
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                       hems_registry                           │
//! │  ┌──────────────┐   ┌────────────────┐   ┌────────────────┐   │
//! │  │ DeviceService│──►│ DeviceRegistry │◄──│  Configurator  │   │
//! │  └──────┬───────┘   └───────┬────────┘   └───────┬────────┘   │
//! │         │                   │                    │            │
//! │         ▼                   ▼                    ▼            │
//! │  ┌──────────────┐   ┌────────────────┐   ┌────────────────┐   │
//! │  │ DeviceStore  │   │ ClassRegistry  │   │ DeviceFactory  │   │
//! │  └──────────────┘   │  (per class)   │   │  (drivers)     │   │
//! │                     └────────────────┘   └────────────────┘   │
//! └───────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod class_registry;
pub mod configure;
pub mod drivers;
pub mod error;
pub mod factory;
pub mod placeholder;
pub mod probe;
pub mod registry;
pub mod service;
pub mod store;

// Re-export key types for convenience
pub use crate::class_registry::{ClassRegistry, Entries, ordered};
pub use crate::error::RegistryError;
pub use crate::factory::{Constructor, DeviceFactory, Factories, FactoryRegistry};
pub use crate::placeholder::PlaceholderVehicle;
pub use crate::probe::{ProbeReport, ProbeResult, capabilities, probe};
pub use crate::registry::DeviceRegistry;
pub use crate::service::{DeviceService, ServiceError};
pub use crate::store::{Device, DeviceDetail, DeviceStore, MemoryStore, StoreError};
