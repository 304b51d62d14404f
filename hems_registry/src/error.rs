//! Registry error types.

use hems_common::device::{Class, DeviceError};
use thiserror::Error;

/// Errors reported by class registries and the bulk configurator.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// A configuration record lacks a name. `position` is 1-based.
    #[error("cannot create {class} {position}: missing name")]
    MissingName {
        /// Device class of the batch.
        class: Class,
        /// 1-based position of the record in the batch.
        position: usize,
    },

    /// The factory rejected the record.
    #[error("cannot create {class} '{name}': {source}")]
    ConstructionFailed {
        /// Device class of the record.
        class: Class,
        /// Record name.
        name: String,
        /// Factory error.
        #[source]
        source: DeviceError,
    },

    /// Name collides with an existing entry.
    #[error("duplicate {class} name: {name} already defined and must be unique")]
    DuplicateName {
        /// Device class of the registry.
        class: Class,
        /// Colliding name.
        name: String,
    },

    /// No entry carries the name.
    #[error("{class} does not exist: {name}")]
    NotFound {
        /// Device class of the registry.
        class: Class,
        /// Requested name.
        name: String,
    },

    /// Name was already resolved in the current pass.
    #[error("duplicate {class} usage: {name}")]
    DuplicateUsage {
        /// Device class of the registry.
        class: Class,
        /// Requested name.
        name: String,
    },

    /// A construction task panicked or was cancelled.
    #[error("construction task failed: {0}")]
    TaskFailed(String),
}
