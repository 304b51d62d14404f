//! HEMS Common Library
//!
//! This crate provides the configuration loading utilities and the device
//! model shared by all HEMS workspace crates.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and types
//! - [`device`] - Device classes, named configuration records and capability traits
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use hems_common::config::{ConfigLoader, HemsConfig};
//! use hems_common::device::{Class, Named};
//! ```

pub mod config;
pub mod device;
pub mod prelude;
