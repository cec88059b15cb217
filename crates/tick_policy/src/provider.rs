//! Policy sources — the configuration collaborator interface.
//!
//! The scheduler never parses configuration files itself. It asks a
//! [`PolicyProvider`] for the policies scoped to a world plus the global
//! defaults, and looks individual policies back up by path when groups
//! re-read their configuration. [`MemoryPolicyProvider`] is the in-memory
//! implementation used by tests and by hosts without a config backend.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;
use tracing::debug;

use crate::policy::{GroupPolicy, ObjectKind, PolicyName, TypeKey, WorldId};

/// Findings from [`MemoryPolicyProvider::validate`].
///
/// Routing stays last-write-wins at runtime; these checks exist for
/// configuration authors who want conflicts surfaced instead.
#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    /// Two policies of the same kind route the same type.
    #[error("type `{key}` is routed by both `{first}` and `{second}`")]
    ConflictingRoute {
        /// The doubly-routed type.
        key: TypeKey,
        /// Policy that routed the type first (in configuration order).
        first: PolicyName,
        /// Policy that routed it again — the one that wins at runtime.
        second: PolicyName,
    },

    /// A policy names a parent that does not exist.
    #[error("policy `{policy}` names missing parent `{parent}`")]
    MissingParent {
        /// The policy with the dangling reference.
        policy: PolicyName,
        /// The missing parent path.
        parent: PolicyName,
    },

    /// A policy and its parent disagree on the object kind.
    #[error("policy `{policy}` and its parent `{parent}` differ in object kind")]
    ParentKindMismatch {
        /// The inheriting policy.
        policy: PolicyName,
        /// Its parent.
        parent: PolicyName,
    },
}

/// Source of group policies.
///
/// Implementations return policies in **configuration order** — the order is
/// load-bearing, because it fixes group insertion order in the container and
/// therefore positional indexing.
pub trait PolicyProvider {
    /// Policies scoped to one world and object kind, in configuration order.
    fn world_policies(&self, world: WorldId, kind: ObjectKind) -> Vec<GroupPolicy>;

    /// Globally-defined policies of the given kind, in configuration order.
    fn global_policies(&self, kind: ObjectKind) -> Vec<GroupPolicy>;

    /// Look up a single policy by its full dotted path.
    ///
    /// `None` means the backing configuration entry no longer exists —
    /// groups holding a snapshot of it become invalid on their next
    /// `read_config`.
    fn lookup(&self, name: &PolicyName) -> Option<GroupPolicy>;
}

/// In-memory [`PolicyProvider`] keyed by policy path.
///
/// A `BTreeMap` keeps configuration order deterministic (lexicographic by
/// path), so repeated runs against the same definitions produce identical
/// group layouts.
#[derive(Debug, Default)]
pub struct MemoryPolicyProvider {
    policies: BTreeMap<PolicyName, GroupPolicy>,
}

impl MemoryPolicyProvider {
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or replace) a policy under its own path.
    pub fn define(&mut self, policy: GroupPolicy) {
        debug!(policy = %policy.name, kind = %policy.kind, "define policy");
        self.policies.insert(policy.name.clone(), policy);
    }

    /// Remove a policy definition.
    ///
    /// Returns `true` if the entry existed. Groups backed by the removed
    /// entry are invalidated on their next `read_config` and dissolved by
    /// the owning container's reload.
    pub fn remove(&mut self, name: &PolicyName) -> bool {
        let removed = self.policies.remove(name).is_some();
        if removed {
            debug!(policy = %name, "remove policy");
        }
        removed
    }

    /// Number of defined policies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Returns `true` if no policies are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Check the whole definition set for authoring mistakes.
    ///
    /// Returns the first finding. A world-local policy sharing a leaf name
    /// with a global one is inheritance, not a conflict, and is not
    /// reported.
    pub fn validate(&self) -> Result<(), PolicyError> {
        for policy in self.policies.values() {
            if let Some(parent_name) = &policy.parent {
                match self.policies.get(parent_name) {
                    None => {
                        return Err(PolicyError::MissingParent {
                            policy: policy.name.clone(),
                            parent: parent_name.clone(),
                        });
                    }
                    Some(parent) if parent.kind != policy.kind => {
                        return Err(PolicyError::ParentKindMismatch {
                            policy: policy.name.clone(),
                            parent: parent_name.clone(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        let mut seen: HashMap<(ObjectKind, &TypeKey), &PolicyName> = HashMap::new();
        for policy in self.policies.values() {
            for key in &policy.routed_types {
                match seen.get(&(policy.kind, key)) {
                    Some(&first) if first.leaf() != policy.name.leaf() => {
                        return Err(PolicyError::ConflictingRoute {
                            key: key.clone(),
                            first: first.clone(),
                            second: policy.name.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        seen.insert((policy.kind, key), &policy.name);
                    }
                }
            }
        }

        Ok(())
    }
}

impl PolicyProvider for MemoryPolicyProvider {
    fn world_policies(&self, world: WorldId, kind: ObjectKind) -> Vec<GroupPolicy> {
        let prefix = PolicyName::world_prefix(world);
        self.policies
            .values()
            .filter(|p| p.kind == kind && p.name.as_str().starts_with(&prefix))
            .cloned()
            .collect()
    }

    fn global_policies(&self, kind: ObjectKind) -> Vec<GroupPolicy> {
        self.policies
            .values()
            .filter(|p| p.kind == kind && p.name.is_global())
            .cloned()
            .collect()
    }

    fn lookup(&self, name: &PolicyName) -> Option<GroupPolicy> {
        self.policies.get(name).cloned()
    }
}
