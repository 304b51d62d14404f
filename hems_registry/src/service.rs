//! Device management service.
//!
//! Framework-independent core of the device management endpoints. Requests
//! arrive as flat option bags carrying `type` (and optionally `name`) next
//! to the device options. Created devices are validated by the factory,
//! persisted, and registered under their store name.

use hems_common::device::{Class, DeviceError, Named, Options, Typed, name_for_id};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::configure::title_case;
use crate::error::RegistryError;
use crate::factory::{DeviceFactory, Factories};
use crate::probe::{ProbeReport, probe};
use crate::registry::DeviceRegistry;
use crate::store::{DeviceStore, StoreError};

/// Device management errors.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// Factory rejected the request.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Device store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Registry rejected the device.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ServiceError {
    /// HTTP status code for the error. All variants are client errors.
    pub fn status_code(&self) -> u16 {
        400
    }
}

/// Validate a request by constructing the device.
async fn construct<D: ?Sized + Send + Sync + 'static>(
    factory: &dyn DeviceFactory<D>,
    typ: &str,
    options: &Options,
) -> Result<Box<D>, ServiceError> {
    Ok(factory.construct(typ, options).await?)
}

/// Device management operations on a shared registry.
pub struct DeviceService {
    registry: Arc<DeviceRegistry>,
    factories: Factories,
    store: Arc<dyn DeviceStore>,
}

impl DeviceService {
    /// Create a service.
    pub fn new(
        registry: Arc<DeviceRegistry>,
        factories: Factories,
        store: Arc<dyn DeviceStore>,
    ) -> Self {
        Self {
            registry,
            factories,
            store,
        }
    }

    /// Registry the service adds to.
    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    /// Configured devices of a class as option bags including `type`.
    pub fn devices(&self, class: Class) -> Vec<Options> {
        self.registry
            .config(class)
            .iter()
            .map(Named::display_options)
            .collect()
    }

    /// Create, persist and register a device. Returns the store id.
    pub async fn create_device(&self, class: Class, request: Options) -> Result<u32, ServiceError> {
        let named = Named::from_request(request);

        let (id, conf) = match class {
            Class::Meter => {
                let meter = construct(self.factories.meter.as_ref(), &named.typ, &named.other).await?;
                let (id, conf) = self.persist(class, named)?;
                self.registry.add_meter(conf.clone(), Arc::from(meter))?;
                (id, conf)
            }
            Class::Charger => {
                let charger = construct(self.factories.charger.as_ref(), &named.typ, &named.other).await?;
                let (id, conf) = self.persist(class, named)?;
                self.registry.add_charger(conf.clone(), Arc::from(charger))?;
                (id, conf)
            }
            Class::Vehicle => {
                let mut vehicle = construct(self.factories.vehicle.as_ref(), &named.typ, &named.other).await?;
                let (id, conf) = self.persist(class, named)?;
                if vehicle.title().is_empty() {
                    vehicle.set_title(title_case(&conf.name));
                }
                self.registry.add_vehicle(conf.clone(), Arc::from(vehicle))?;
                (id, conf)
            }
        };

        info!("created {} '{}' ({})", class, conf.name, conf.typ);
        Ok(id)
    }

    /// Validate and persist new options for a stored device.
    ///
    /// The running registry keeps the old device until the next configure.
    pub async fn update_device(
        &self,
        class: Class,
        id: u32,
        request: Options,
    ) -> Result<u32, ServiceError> {
        let named = Named::from_request(request);

        match class {
            Class::Meter => {
                construct(self.factories.meter.as_ref(), &named.typ, &named.other).await?;
            }
            Class::Charger => {
                construct(self.factories.charger.as_ref(), &named.typ, &named.other).await?;
            }
            Class::Vehicle => {
                construct(self.factories.vehicle.as_ref(), &named.typ, &named.other).await?;
            }
        }

        self.store.update_device(class, id, &named.other)?;
        info!("updated {} {}", class, name_for_id(id));
        Ok(id)
    }

    /// Construct a device without persisting it and read its capabilities.
    ///
    /// The request carries no name; any `name` key reaches the factory as an
    /// ordinary option.
    pub async fn test_device(
        &self,
        class: Class,
        request: Options,
    ) -> Result<ProbeReport, ServiceError> {
        let Typed { typ, other } = Typed::from_request(request);

        let report = match class {
            Class::Meter => {
                let meter = construct(self.factories.meter.as_ref(), &typ, &other).await?;
                probe(&*meter)
            }
            Class::Charger => {
                let charger = construct(self.factories.charger.as_ref(), &typ, &other).await?;
                probe(&*charger)
            }
            Class::Vehicle => {
                let vehicle = construct(self.factories.vehicle.as_ref(), &typ, &other).await?;
                probe(&*vehicle)
            }
        };

        Ok(report)
    }

    /// File configuration followed by the persisted devices of the class.
    pub fn load_configured(&self, class: Class, conf: &[Named]) -> Result<Vec<Named>, ServiceError> {
        let mut res = conf.to_vec();
        res.extend(self.store.devices(class)?.iter().map(|d| d.as_named()));
        Ok(res)
    }

    /// Store the record and rename it after its id.
    fn persist(&self, class: Class, named: Named) -> Result<(u32, Named), ServiceError> {
        let id = self.store.add_device(class, &named.typ, &named.other)?;
        let conf = Named {
            name: name_for_id(id),
            ..named
        };
        Ok((id, conf))
    }
}
