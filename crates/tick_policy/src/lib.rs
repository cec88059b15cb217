//! # tick_policy
//!
//! Policy model and configuration interface for the grouped tick scheduler.
//!
//! This crate provides:
//!
//! - [`GroupPolicy`] — configuration describing one tick group: routed types,
//!   parent inheritance, tick priority.
//! - [`PolicyName`] / [`TypeKey`] / [`WorldId`] / [`ObjectKind`] — the
//!   identifier vocabulary shared with the container crate.
//! - [`PolicyProvider`] — the interface the scheduler consumes configuration
//!   through.
//! - [`MemoryPolicyProvider`] — in-memory provider for tests and hosts
//!   without a config backend, including authoring-time validation.

pub mod policy;
pub mod provider;

pub use policy::{
    DEFAULT_PRIORITY, GLOBAL_PREFIX, GroupPolicy, ObjectKind, PolicyName, TypeKey, WORLDS_PREFIX,
    WorldId,
};
pub use provider::{MemoryPolicyProvider, PolicyError, PolicyProvider};
