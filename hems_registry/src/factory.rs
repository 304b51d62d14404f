//! Factory boundary for device construction.
//!
//! Provides the `DeviceFactory` trait the registry calls to turn a type
//! identifier and an options bag into a device handle, and
//! `FactoryRegistry`, a table-driven implementation populated with
//! constructor functions at startup. This uses constructor-injection rather
//! than global state.

use async_trait::async_trait;
use futures::future::BoxFuture;
use hems_common::device::{Charger, Class, DeviceError, Meter, Options, TEMPLATE_TYPE, Vehicle};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::drivers;

/// Constructor function for one device type.
pub type Constructor<D> = fn(Options) -> BoxFuture<'static, Result<Box<D>, DeviceError>>;

/// Constructs devices of one class from type and options.
///
/// Implementations must be safe to call repeatedly with the same
/// arguments. Construction may perform network I/O.
#[async_trait]
pub trait DeviceFactory<D: ?Sized + Send + Sync + 'static>: Send + Sync {
    /// Build a device.
    ///
    /// # Errors
    /// `DeviceError::Config` when the type or options are invalid; any
    /// other variant for environmental failures.
    async fn construct(&self, typ: &str, options: &Options) -> Result<Box<D>, DeviceError>;
}

/// Table of constructors for one device class.
pub struct FactoryRegistry<D: ?Sized> {
    class: Class,
    constructors: HashMap<&'static str, Constructor<D>>,
}

impl<D: ?Sized> FactoryRegistry<D> {
    /// Create an empty registry.
    pub fn new(class: Class) -> Self {
        Self {
            class,
            constructors: HashMap::new(),
        }
    }

    /// Register a constructor.
    ///
    /// # Panics
    /// Panics if a constructor with the same type is already registered.
    pub fn register(&mut self, typ: &'static str, constructor: Constructor<D>) {
        if self.constructors.contains_key(typ) {
            panic!("{} type '{typ}' is already registered", self.class);
        }
        self.constructors.insert(typ, constructor);
    }

    /// Get a constructor by type.
    pub fn get_constructor(&self, typ: &str) -> Option<Constructor<D>> {
        self.constructors.get(typ).copied()
    }

    /// List all registered types.
    pub fn list_types(&self) -> Vec<&'static str> {
        self.constructors.keys().copied().collect()
    }

    /// Resolve the constructor and the options it receives.
    ///
    /// The template sentinel takes the real type from the `template` option.
    fn resolve(&self, typ: &str, options: &Options) -> Result<(Constructor<D>, Options), DeviceError> {
        let mut options = options.clone();

        let typ = if typ.eq_ignore_ascii_case(TEMPLATE_TYPE) {
            match options.remove("template") {
                Some(serde_json::Value::String(template)) => template,
                _ => {
                    return Err(DeviceError::Config(format!(
                        "{} template: missing template name",
                        self.class
                    )));
                }
            }
        } else {
            typ.to_string()
        };

        let constructor = self
            .get_constructor(&typ.to_ascii_lowercase())
            .ok_or_else(|| DeviceError::Config(format!("{} type '{typ}': unknown type", self.class)))?;

        Ok((constructor, options))
    }
}

#[async_trait]
impl<D: ?Sized + Send + Sync + 'static> DeviceFactory<D> for FactoryRegistry<D> {
    async fn construct(&self, typ: &str, options: &Options) -> Result<Box<D>, DeviceError> {
        let (constructor, options) = self.resolve(typ, options)?;
        debug!("constructing {} of type '{}'", self.class, typ);
        constructor(options).await
    }
}

/// One factory per device class.
#[derive(Clone)]
pub struct Factories {
    /// Meter factory.
    pub meter: Arc<dyn DeviceFactory<dyn Meter>>,
    /// Charger factory.
    pub charger: Arc<dyn DeviceFactory<dyn Charger>>,
    /// Vehicle factory.
    pub vehicle: Arc<dyn DeviceFactory<dyn Vehicle>>,
}

impl Factories {
    /// Factories with all built-in drivers registered.
    pub fn builtin() -> Self {
        let mut meter = FactoryRegistry::new(Class::Meter);
        let mut charger = FactoryRegistry::new(Class::Charger);
        let mut vehicle = FactoryRegistry::new(Class::Vehicle);

        drivers::register_all_drivers(&mut meter, &mut charger, &mut vehicle);

        Self {
            meter: Arc::new(meter),
            charger: Arc::new(charger),
            vehicle: Arc::new(vehicle),
        }
    }
}
