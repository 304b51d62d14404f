//! Persisted device store.
//!
//! Devices created at runtime are persisted before they enter the registry.
//! A persisted device carries a numeric id, its class and type, and its
//! options flattened to string key/value details. It is registered under
//! the name returned by [`name_for_id`].

use hems_common::device::{Class, Named, Options, name_for_id};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Device store errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// No device with this id.
    #[error("device not found: {0}")]
    NotFound(u32),

    /// Device exists but belongs to another class.
    #[error("device {id} is a {actual}, not a {expected}")]
    ClassMismatch {
        /// Device id.
        id: u32,
        /// Class the caller asked for.
        expected: Class,
        /// Stored class.
        actual: Class,
    },
}

/// One configuration detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDetail {
    /// Option key.
    pub key: String,
    /// Option value rendered as string.
    pub value: String,
}

/// Persisted device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Store-assigned id.
    pub id: u32,
    /// Device class.
    pub class: Class,
    /// Implementation type.
    #[serde(rename = "type")]
    pub typ: String,
    /// Configuration details.
    pub details: Vec<DeviceDetail>,
}

impl Device {
    /// Details as options bag.
    pub fn as_map(&self) -> Options {
        self.details
            .iter()
            .map(|d| (d.key.clone(), serde_json::Value::String(d.value.clone())))
            .collect()
    }

    /// Configuration record under the registry name for this id.
    pub fn as_named(&self) -> Named {
        Named {
            name: name_for_id(self.id),
            typ: self.typ.clone(),
            other: self.as_map(),
        }
    }
}

/// Render an option value as detail string.
fn detail_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn details(config: &Options) -> Vec<DeviceDetail> {
    config
        .iter()
        .map(|(key, value)| DeviceDetail {
            key: key.clone(),
            value: detail_value(value),
        })
        .collect()
}

/// Durable storage for runtime-created devices.
pub trait DeviceStore: Send + Sync {
    /// Devices of a class. Devices without details are omitted.
    fn devices(&self, class: Class) -> Result<Vec<Device>, StoreError>;

    /// Device by id.
    fn device_by_id(&self, id: u32) -> Result<Device, StoreError>;

    /// Persist a new device and return its id.
    fn add_device(&self, class: Class, typ: &str, config: &Options) -> Result<u32, StoreError>;

    /// Replace the details of an existing device.
    fn update_device(&self, class: Class, id: u32, config: &Options) -> Result<(), StoreError>;
}

#[derive(Default)]
struct MemoryInner {
    last_id: u32,
    devices: BTreeMap<u32, Device>,
}

/// In-memory device store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeviceStore for MemoryStore {
    fn devices(&self, class: Class) -> Result<Vec<Device>, StoreError> {
        Ok(self
            .inner
            .lock()
            .devices
            .values()
            .filter(|d| d.class == class && !d.details.is_empty())
            .cloned()
            .collect())
    }

    fn device_by_id(&self, id: u32) -> Result<Device, StoreError> {
        self.inner
            .lock()
            .devices
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn add_device(&self, class: Class, typ: &str, config: &Options) -> Result<u32, StoreError> {
        let mut inner = self.inner.lock();
        inner.last_id += 1;
        let id = inner.last_id;

        inner.devices.insert(
            id,
            Device {
                id,
                class,
                typ: typ.to_string(),
                details: details(config),
            },
        );

        debug!("stored {} {} ({})", class, id, typ);
        Ok(id)
    }

    fn update_device(&self, class: Class, id: u32, config: &Options) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let device = inner.devices.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if device.class != class {
            return Err(StoreError::ClassMismatch {
                id,
                expected: class,
                actual: device.class,
            });
        }

        device.details = details(config);
        debug!("updated {} {}", class, id);
        Ok(())
    }
}
