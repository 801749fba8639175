//! Shared types and resolution primitives for the Permesso permission system.
//!
//! This crate contains everything a permission backend needs to implement the
//! provider contract: the tri-state value algebra, the wildcard key resolver,
//! typed value adapters, the actor context, and the `PermissionProvider`
//! trait itself. It performs no I/O; persistence and provider selection live
//! in `permesso-core`.

pub mod context;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod resolve;
pub mod value;
pub mod value_adapter;

// vim: ts=4
