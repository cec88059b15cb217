//! Group policy definitions.
//!
//! A [`GroupPolicy`] is the configuration-derived description of one tick
//! group: which object types it routes, which global policy it inherits from,
//! and its tick priority. Policies are pure data — runtime membership lives
//! in the scheduling container, never here.
//!
//! ## Inheritance
//!
//! A policy may name a **parent** (a globally-defined policy it overrides or
//! extends). Inheritance is an explicit two-level lookup: a field set locally
//! wins, otherwise the parent's value applies, otherwise the default. There
//! is no deeper chain — a parent never has a parent of its own.

use serde::{Deserialize, Serialize};

/// Identifies one world (dimension) instance on the host.
///
/// Worlds scope policy definitions: a policy defined under a world's
/// configuration path applies only to containers bound to that world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldId(pub u32);

impl std::fmt::Display for WorldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dim{}", self.0)
    }
}

/// The object-type domain a policy (and a container) applies to.
///
/// Hosts schedule two kinds of objects through separate lists: **actors**
/// (independently moving objects) and **fixtures** (stationary ticking
/// machinery). A policy routes types of exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Independently moving, self-scheduling objects.
    Actor,
    /// Stationary objects ticked in place.
    Fixture,
}

impl ObjectKind {
    /// Leaf name of the fallback group every container of this kind requires.
    ///
    /// Objects whose type no policy routes land in this group. The policy
    /// backing it must exist (globally or per-world) — container construction
    /// fails otherwise.
    #[must_use]
    pub const fn fallback_group(self) -> &'static str {
        match self {
            ObjectKind::Actor => "actors",
            ObjectKind::Fixture => "fixtures",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::Actor => write!(f, "actor"),
            ObjectKind::Fixture => write!(f, "fixture"),
        }
    }
}

/// Dotted configuration path identifying a policy.
///
/// Global policies live under `groups.` (e.g. `groups.monsters`); world-local
/// policies live under `worlds.dim<N>.` (e.g. `worlds.dim0.monsters`). The
/// last dotted segment is the **leaf** name; groups are unique by leaf name
/// within one container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyName(String);

/// Path prefix for globally-defined policies.
pub const GLOBAL_PREFIX: &str = "groups";

/// Path prefix for world-scoped policy trees.
pub const WORLDS_PREFIX: &str = "worlds";

impl PolicyName {
    /// Create a policy name from a full dotted path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The path of the global policy with the given leaf name.
    #[must_use]
    pub fn global(leaf: &str) -> Self {
        Self(format!("{GLOBAL_PREFIX}.{leaf}"))
    }

    /// The path of the given world's policy with the given leaf name.
    #[must_use]
    pub fn world(world: WorldId, leaf: &str) -> Self {
        Self(format!("{WORLDS_PREFIX}.{world}.{leaf}"))
    }

    /// The configuration path prefix under which a world's policies live,
    /// including the trailing dot.
    #[must_use]
    pub fn world_prefix(world: WorldId) -> String {
        format!("{WORLDS_PREFIX}.{world}.")
    }

    /// The full dotted path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last dotted segment.
    #[must_use]
    pub fn leaf(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Returns `true` if this names a globally-defined policy.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.0
            .strip_prefix(GLOBAL_PREFIX)
            .is_some_and(|rest| rest.starts_with('.'))
    }
}

impl std::fmt::Display for PolicyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PolicyName {
    fn from(path: &str) -> Self {
        Self(path.to_string())
    }
}

/// Opaque identifier for a host object's runtime type (e.g. `"mob.zombie"`).
///
/// The scheduler never interprets the contents — equality is all that
/// matters. Hosts typically use registry names so configuration files can
/// route types without referencing host internals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(String);

impl TypeKey {
    /// Create a type key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// Tick priority applied when neither a policy nor its parent sets one.
pub const DEFAULT_PRIORITY: i32 = 0;

/// Configuration describing one tick group.
///
/// `routed_types` and `priority` resolve through the two-level inheritance
/// lookup — see [`GroupPolicy::effective_routes`] and
/// [`GroupPolicy::effective_priority`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPolicy {
    /// Full dotted configuration path of this policy.
    pub name: PolicyName,
    /// The object-type domain this policy applies to.
    pub kind: ObjectKind,
    /// Runtime types routed to this group, in configuration order.
    #[serde(default)]
    pub routed_types: Vec<TypeKey>,
    /// Global policy this one inherits from, if any.
    #[serde(default)]
    pub parent: Option<PolicyName>,
    /// Tick priority override. Higher values tick first under budget
    /// pressure. Absent means "inherit from the parent".
    #[serde(default)]
    pub priority: Option<i32>,
}

impl GroupPolicy {
    /// Create a policy with no routes, no parent, and inherited priority.
    #[must_use]
    pub fn new(name: PolicyName, kind: ObjectKind) -> Self {
        Self {
            name,
            kind,
            routed_types: Vec::new(),
            parent: None,
            priority: None,
        }
    }

    /// Route an additional runtime type to this group.
    #[must_use]
    pub fn route(mut self, key: impl Into<TypeKey>) -> Self {
        self.routed_types.push(key.into());
        self
    }

    /// Set the parent policy this one inherits from.
    #[must_use]
    pub fn with_parent(mut self, parent: PolicyName) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set the local priority override.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Resolve the tick priority: local value, else the parent's, else
    /// [`DEFAULT_PRIORITY`].
    #[must_use]
    pub fn effective_priority(&self, parent: Option<&GroupPolicy>) -> i32 {
        self.priority
            .or_else(|| parent.and_then(|p| p.priority))
            .unwrap_or(DEFAULT_PRIORITY)
    }

    /// Resolve the routed-type set: the local set when non-empty, else the
    /// parent's.
    #[must_use]
    pub fn effective_routes<'a>(&'a self, parent: Option<&'a GroupPolicy>) -> &'a [TypeKey] {
        if !self.routed_types.is_empty() {
            &self.routed_types
        } else if let Some(parent) = parent {
            &parent.routed_types
        } else {
            &[]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_name_leaf() {
        assert_eq!(PolicyName::global("monsters").leaf(), "monsters");
        assert_eq!(PolicyName::world(WorldId(3), "actors").leaf(), "actors");
        assert_eq!(PolicyName::new("bare").leaf(), "bare");
    }

    #[test]
    fn test_policy_name_paths() {
        assert_eq!(PolicyName::global("monsters").as_str(), "groups.monsters");
        assert_eq!(
            PolicyName::world(WorldId(0), "monsters").as_str(),
            "worlds.dim0.monsters"
        );
    }

    #[test]
    fn test_policy_name_is_global() {
        assert!(PolicyName::global("actors").is_global());
        assert!(!PolicyName::world(WorldId(0), "actors").is_global());
        // A leaf that merely starts with the prefix string is not global.
        assert!(!PolicyName::new("groupsmore.actors").is_global());
    }

    #[test]
    fn test_effective_priority_local_wins() {
        let parent = GroupPolicy::new(PolicyName::global("monsters"), ObjectKind::Actor)
            .with_priority(2);
        let local = GroupPolicy::new(PolicyName::world(WorldId(0), "monsters"), ObjectKind::Actor)
            .with_parent(parent.name.clone())
            .with_priority(7);
        assert_eq!(local.effective_priority(Some(&parent)), 7);
    }

    #[test]
    fn test_effective_priority_falls_back_to_parent() {
        let parent = GroupPolicy::new(PolicyName::global("monsters"), ObjectKind::Actor)
            .with_priority(2);
        let local = GroupPolicy::new(PolicyName::world(WorldId(0), "monsters"), ObjectKind::Actor)
            .with_parent(parent.name.clone());
        assert_eq!(local.effective_priority(Some(&parent)), 2);
        assert_eq!(local.effective_priority(None), DEFAULT_PRIORITY);
    }

    #[test]
    fn test_effective_routes_inherit() {
        let parent = GroupPolicy::new(PolicyName::global("monsters"), ObjectKind::Actor)
            .route("mob.zombie")
            .route("mob.skeleton");
        let local = GroupPolicy::new(PolicyName::world(WorldId(0), "monsters"), ObjectKind::Actor);
        assert_eq!(local.effective_routes(Some(&parent)).len(), 2);

        let overriding = local.clone().route("mob.creeper");
        assert_eq!(overriding.effective_routes(Some(&parent)).len(), 1);
        assert_eq!(
            overriding.effective_routes(Some(&parent))[0],
            TypeKey::from("mob.creeper")
        );
    }

    #[test]
    fn test_policy_serde_roundtrip() {
        let policy = GroupPolicy::new(PolicyName::global("monsters"), ObjectKind::Actor)
            .route("mob.zombie")
            .with_priority(5);
        let json = serde_json::to_string(&policy).unwrap();
        let restored: GroupPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(policy, restored);
    }

    #[test]
    fn test_policy_deserialize_defaults() {
        // Omitted fields fall back to empty routes / no parent / inherited
        // priority, so hand-written config stays terse.
        let json = r#"{"name": "groups.machines", "kind": "Fixture"}"#;
        let policy: GroupPolicy = serde_json::from_str(json).unwrap();
        assert!(policy.routed_types.is_empty());
        assert!(policy.parent.is_none());
        assert!(policy.priority.is_none());
        assert_eq!(policy.effective_priority(None), DEFAULT_PRIORITY);
    }
}
