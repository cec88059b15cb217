//! Type-to-group routing.
//!
//! The [`ClassRouter`] is derived state: rebuilt whenever the group set
//! changes by scanning every live group's routed-type set. It is never the
//! source of truth — membership lives in the groups.

use std::collections::HashMap;

use tick_policy::TypeKey;
use tracing::{debug, trace};

use crate::group::{GroupId, TickGroup};

/// Mapping from object runtime type to the group responsible for it.
///
/// When several groups route the same type, the last one in group insertion
/// order wins. The router does not detect the overlap — conflict detection is
/// a configuration-authoring concern (`MemoryPolicyProvider::validate`).
#[derive(Debug, Default)]
pub struct ClassRouter {
    routes: HashMap<TypeKey, GroupId>,
}

impl ClassRouter {
    /// The group responsible for the given type, if any routes it.
    #[must_use]
    pub fn resolve(&self, key: &TypeKey) -> Option<GroupId> {
        self.routes.get(key).copied()
    }

    /// Number of routed types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no types are routed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Replace the mapping by scanning the given group sequence.
    ///
    /// O(total routed types). Existing membership is untouched — routing only
    /// affects future placements.
    pub(crate) fn rebuild(&mut self, groups: &[TickGroup]) {
        self.routes.clear();
        for (index, group) in groups.iter().enumerate() {
            for key in group.routed_types() {
                trace!(type_key = %key, group = group.leaf(), "route");
                self.routes.insert(key.clone(), GroupId(index));
            }
        }
        debug!(types = self.routes.len(), groups = groups.len(), "rebuilt class router");
    }

    /// Iterate the current routes.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (&TypeKey, GroupId)> {
        self.routes.iter().map(|(key, &group)| (key, group))
    }
}

#[cfg(test)]
mod tests {
    use tick_policy::{GroupPolicy, ObjectKind, PolicyName};

    use super::*;
    use crate::group::TickGroup;

    fn group_routing(leaf: &str, keys: &[&str]) -> TickGroup {
        let mut policy = GroupPolicy::new(PolicyName::global(leaf), ObjectKind::Actor);
        for key in keys {
            policy = policy.route(*key);
        }
        TickGroup::from_global_policy(policy)
    }

    #[test]
    fn test_resolve_routed_types() {
        let groups = vec![
            group_routing("monsters", &["mob.zombie", "mob.skeleton"]),
            group_routing("animals", &["mob.cow"]),
        ];
        let mut router = ClassRouter::default();
        router.rebuild(&groups);

        assert_eq!(router.len(), 3);
        assert_eq!(router.resolve(&TypeKey::from("mob.zombie")), Some(GroupId(0)));
        assert_eq!(router.resolve(&TypeKey::from("mob.cow")), Some(GroupId(1)));
        assert_eq!(router.resolve(&TypeKey::from("mob.creeper")), None);
    }

    #[test]
    fn test_last_group_wins_on_overlap() {
        let groups = vec![
            group_routing("monsters", &["mob.zombie"]),
            group_routing("undead", &["mob.zombie"]),
        ];
        let mut router = ClassRouter::default();
        router.rebuild(&groups);

        assert_eq!(router.resolve(&TypeKey::from("mob.zombie")), Some(GroupId(1)));
    }

    #[test]
    fn test_rebuild_replaces_previous_mapping() {
        let mut router = ClassRouter::default();
        router.rebuild(&[group_routing("monsters", &["mob.zombie"])]);
        assert_eq!(router.len(), 1);

        router.rebuild(&[group_routing("animals", &["mob.cow"])]);
        assert_eq!(router.len(), 1);
        assert_eq!(router.resolve(&TypeKey::from("mob.zombie")), None);
    }
}
