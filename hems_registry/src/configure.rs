//! Bulk configurator.
//!
//! Builds a complete entry set for one device class from a declarative list
//! of [`Named`] records. The result is all-or-nothing: the first missing
//! name, construction failure or duplicate name aborts the batch, and the
//! caller swaps the entry set into the live registry only on success.
//! Missing and repeated names are rejected before any factory call.
//!
//! Construction runs outside any registry lock. Concurrent batches spawn one
//! task per record; results are inserted by the collecting task in
//! completion order.

use hems_common::device::{Class, DeviceError, Named, Vehicle};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::class_registry::Entries;
use crate::error::RegistryError;
use crate::factory::DeviceFactory;
use crate::placeholder::PlaceholderVehicle;

/// Post-construction hook applied to every factory result.
pub type Finish<D> = fn(&Named, Result<Box<D>, DeviceError>) -> Result<Box<D>, DeviceError>;

/// Finish hook passing the factory result through unchanged.
pub fn passthrough<D: ?Sized>(
    _config: &Named,
    res: Result<Box<D>, DeviceError>,
) -> Result<Box<D>, DeviceError> {
    res
}

/// Finish hook for vehicles.
///
/// Configuration errors stay fatal. Any other error is replaced by a
/// [`PlaceholderVehicle`] carrying it. Every vehicle leaves with a title.
pub fn finish_vehicle(
    config: &Named,
    res: Result<Box<dyn Vehicle>, DeviceError>,
) -> Result<Box<dyn Vehicle>, DeviceError> {
    let mut vehicle: Box<dyn Vehicle> = match res {
        Ok(vehicle) => vehicle,
        Err(err) if err.is_config() => return Err(err),
        Err(err) => {
            warn!(
                "vehicle '{}' unavailable, continuing degraded: {}",
                config.name, err
            );
            Box::new(PlaceholderVehicle::new(err))
        }
    };

    if vehicle.title().is_empty() {
        vehicle.set_title(title_case(&config.name));
    }

    Ok(vehicle)
}

/// Capitalize the first letter of every word.
pub fn title_case(s: &str) -> String {
    let mut res = String::with_capacity(s.len());
    let mut boundary = true;

    for c in s.chars() {
        if boundary {
            res.extend(c.to_uppercase());
        } else {
            res.push(c);
        }
        boundary = !(c.is_alphanumeric() || c == '_');
    }

    res
}

/// Check every record has a name and no name repeats.
///
/// Records are checked in order; the first offending record decides the
/// error.
///
/// # Errors
/// - `RegistryError::MissingName` with the 1-based position of an unnamed
///   record
/// - `RegistryError::DuplicateName` for the first repeated name
pub fn validate_names(class: Class, conf: &[Named]) -> Result<(), RegistryError> {
    let mut seen = HashSet::with_capacity(conf.len());

    for (idx, cc) in conf.iter().enumerate() {
        if cc.name.is_empty() {
            return Err(RegistryError::MissingName {
                class,
                position: idx + 1,
            });
        }

        if !seen.insert(cc.name.as_str()) {
            return Err(RegistryError::DuplicateName {
                class,
                name: cc.name.clone(),
            });
        }
    }

    Ok(())
}

/// Run one factory call, bounded by `timeout` if given.
async fn construct_one<D: ?Sized + Send + Sync + 'static>(
    factory: &dyn DeviceFactory<D>,
    config: &Named,
    timeout: Option<Duration>,
) -> Result<Box<D>, DeviceError> {
    let fut = factory.construct(&config.typ, &config.other);

    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| DeviceError::Timeout(limit))?,
        None => fut.await,
    }
}

/// Build entries one record after the other.
///
/// # Errors
/// `MissingName`, `ConstructionFailed` or `DuplicateName` for the first
/// failing record.
pub async fn configure_sequential<D: ?Sized + Send + Sync + 'static>(
    class: Class,
    conf: &[Named],
    factory: &dyn DeviceFactory<D>,
    timeout: Option<Duration>,
    finish: Finish<D>,
) -> Result<Entries<D>, RegistryError> {
    validate_names(class, conf)?;

    let mut entries = Entries::new(class);
    for cc in conf {
        let res = construct_one(factory, cc, timeout).await;
        let device = finish(cc, res).map_err(|source| RegistryError::ConstructionFailed {
            class,
            name: cc.name.clone(),
            source,
        })?;

        debug!("created {} '{}' ({})", class, cc.name, cc.typ);
        entries.insert(cc.clone(), Arc::from(device))?;
    }

    Ok(entries)
}

/// Build entries with one construction task per record.
///
/// Remaining tasks are aborted as soon as one record fails.
///
/// # Errors
/// `MissingName`, `ConstructionFailed`, `DuplicateName` or `TaskFailed` for
/// the first failure observed.
pub async fn configure_concurrent<D: ?Sized + Send + Sync + 'static>(
    class: Class,
    conf: &[Named],
    factory: Arc<dyn DeviceFactory<D>>,
    timeout: Option<Duration>,
    finish: Finish<D>,
) -> Result<Entries<D>, RegistryError> {
    validate_names(class, conf)?;

    let mut tasks = JoinSet::new();
    for cc in conf.iter().cloned() {
        let factory = Arc::clone(&factory);

        tasks.spawn(async move {
            let res = construct_one(factory.as_ref(), &cc, timeout).await;
            match finish(&cc, res) {
                Ok(device) => Ok((cc, device)),
                Err(source) => Err(RegistryError::ConstructionFailed {
                    class,
                    name: cc.name,
                    source,
                }),
            }
        });
    }

    let mut entries = Entries::new(class);
    while let Some(joined) = tasks.join_next().await {
        let (cc, device) = joined.map_err(|e| RegistryError::TaskFailed(e.to_string()))??;

        debug!("created {} '{}' ({})", class, cc.name, cc.typ);
        entries.insert(cc, Arc::from(device))?;
    }

    Ok(entries)
}
