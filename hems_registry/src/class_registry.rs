//! Name-indexed store of one device class.
//!
//! A `ClassRegistry` owns the live handles of one class together with the
//! configuration records they were built from. Names are unique at all
//! times; an entry's record and handle become visible together.
//!
//! Duplicate-usage tracking is opt-in: after [`ClassRegistry::track_visitors`]
//! each name resolves at most once until the next call.

use hems_common::device::{Class, Named};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::RegistryError;

/// One registry entry: record plus live handle.
struct Container<D: ?Sized> {
    config: Named,
    device: Arc<D>,
}

/// Ordered, name-unique set of entries.
///
/// Built off-line by the configurator and swapped into a [`ClassRegistry`]
/// in one step.
pub struct Entries<D: ?Sized> {
    class: Class,
    containers: Vec<Container<D>>,
}

impl<D: ?Sized> Entries<D> {
    /// Create an empty entry set.
    pub fn new(class: Class) -> Self {
        Self {
            class,
            containers: Vec::new(),
        }
    }

    /// Append an entry.
    ///
    /// # Errors
    /// Returns `RegistryError::DuplicateName` if the name exists; the set is
    /// left unchanged.
    pub fn insert(&mut self, config: Named, device: Arc<D>) -> Result<(), RegistryError> {
        if self.get(&config.name).is_some() {
            return Err(RegistryError::DuplicateName {
                class: self.class,
                name: config.name,
            });
        }

        self.containers.push(Container { config, device });
        Ok(())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    fn get(&self, name: &str) -> Option<&Container<D>> {
        self.containers.iter().find(|c| c.config.name == name)
    }
}

/// Registry of one device class.
pub struct ClassRegistry<D: ?Sized> {
    class: Class,
    entries: RwLock<Entries<D>>,
    /// Names resolved in the current pass. `None` until tracking starts.
    visited: Mutex<Option<HashSet<String>>>,
}

impl<D: ?Sized> ClassRegistry<D> {
    /// Create an empty registry.
    pub fn new(class: Class) -> Self {
        Self {
            class,
            entries: RwLock::new(Entries::new(class)),
            visited: Mutex::new(None),
        }
    }

    /// Device class served by this registry.
    pub fn class(&self) -> Class {
        self.class
    }

    /// Add a device and its configuration.
    ///
    /// # Errors
    /// Returns `RegistryError::DuplicateName` if the name exists.
    pub fn add(&self, config: Named, device: Arc<D>) -> Result<(), RegistryError> {
        self.entries.write().insert(config, device)
    }

    /// Resolve a device by name.
    ///
    /// # Errors
    /// - `RegistryError::NotFound` if no entry carries the name
    /// - `RegistryError::DuplicateUsage` if tracking is enabled and the name
    ///   was already resolved in this pass
    pub fn by_name(&self, name: &str) -> Result<Arc<D>, RegistryError> {
        let device = self
            .entries
            .read()
            .get(name)
            .map(|c| Arc::clone(&c.device))
            .ok_or_else(|| RegistryError::NotFound {
                class: self.class,
                name: name.to_string(),
            })?;

        // track duplicate usage
        if let Some(visited) = self.visited.lock().as_mut() {
            if !visited.insert(name.to_string()) {
                return Err(RegistryError::DuplicateUsage {
                    class: self.class,
                    name: name.to_string(),
                });
            }
        }

        Ok(device)
    }

    /// Snapshot of all devices by name.
    pub fn devices(&self) -> HashMap<String, Arc<D>> {
        self.entries
            .read()
            .containers
            .iter()
            .map(|c| (c.config.name.clone(), Arc::clone(&c.device)))
            .collect()
    }

    /// Snapshot of all configuration records in insertion order.
    pub fn config(&self) -> Vec<Named> {
        self.entries
            .read()
            .containers
            .iter()
            .map(|c| c.config.clone())
            .collect()
    }

    /// Start a new pass of duplicate-usage tracking.
    pub fn track_visitors(&self) {
        *self.visited.lock() = Some(HashSet::new());
    }

    /// Replace the whole content with a freshly built entry set.
    ///
    /// Readers observe either the old or the new content.
    pub fn replace(&self, entries: Entries<D>) {
        debug_assert_eq!(entries.class, self.class);
        *self.entries.write() = entries;
    }

    /// True if an entry carries the name.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().get(name).is_some()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Values of a map ordered by key.
pub fn ordered<V: Clone>(map: &HashMap<String, V>) -> Vec<V> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    keys.into_iter().map(|k| map[k].clone()).collect()
}
