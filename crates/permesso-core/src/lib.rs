//! Provider composition for the Permesso permission system.
//!
//! This crate wires permission backends together: hosts register providers
//! into a [`registry::ProviderRegistry`], hand it to a
//! [`registry::PermissionService`], and the service applies the priority
//! based selection policy, persists the choice, and exposes the single
//! active provider. The built-in [`vanilla::VanillaProvider`] covers hosts
//! with no external permission system installed.

pub mod config;
pub mod prelude;
pub mod registry;
pub mod require;
pub mod vanilla;

pub use permesso_types as types;

pub use config::{ConfigStore, PermissionsConfig};
pub use registry::{PermissionService, ProviderRegistry};
pub use require::{PermissionPredicate, require, require_level};
pub use vanilla::VanillaProvider;

// vim: ts=4
