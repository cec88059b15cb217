//! Live tick groups.
//!
//! A [`TickGroup`] is one policy bound to one container: the policy snapshot
//! plus the ordered membership of objects currently routed to it. Groups are
//! created and destroyed only by their owning container; all membership
//! mutation flows through the container so the side-table bookkeeping stays
//! in sync.

use serde::Serialize;
use tick_policy::{DEFAULT_PRIORITY, GroupPolicy, PolicyProvider, TypeKey};
use tracing::debug;

use crate::member::ObjectId;

/// Identifies a group within one container.
///
/// An index into the container's insertion-ordered group sequence. Only
/// meaningful for the container that issued it, and only until the next
/// reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub(crate) usize);

/// Where a group's definition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupOrigin {
    /// Defined in the world's own configuration tree.
    World,
    /// Cloned from a globally-defined policy ("inherit settings, not
    /// membership").
    Global,
}

/// One live instance of a group policy, bound to one container.
#[derive(Debug)]
pub struct TickGroup {
    leaf: String,
    origin: GroupOrigin,
    /// World-scoped policy snapshot. Absent for pure global clones.
    local: Option<GroupPolicy>,
    /// Snapshot of the global parent policy, if any.
    parent: Option<GroupPolicy>,
    members: Vec<ObjectId>,
    valid: bool,
}

impl TickGroup {
    /// Create a group from a world-scoped policy, with an optional global
    /// parent it inherits from.
    pub(crate) fn from_world_policy(policy: GroupPolicy, parent: Option<GroupPolicy>) -> Self {
        Self {
            leaf: policy.name.leaf().to_string(),
            origin: GroupOrigin::World,
            local: Some(policy),
            parent,
            members: Vec::new(),
            valid: true,
        }
    }

    /// Create a group as a local clone of a globally-defined policy.
    pub(crate) fn from_global_policy(policy: GroupPolicy) -> Self {
        Self {
            leaf: policy.name.leaf().to_string(),
            origin: GroupOrigin::Global,
            local: None,
            parent: Some(policy),
            members: Vec::new(),
            valid: true,
        }
    }

    /// The group's leaf name, unique within its container.
    #[must_use]
    pub fn leaf(&self) -> &str {
        &self.leaf
    }

    /// Where this group's definition came from.
    #[must_use]
    pub fn origin(&self) -> GroupOrigin {
        self.origin
    }

    /// `false` once the backing configuration entry (or the parent's) has
    /// disappeared. Invalid groups keep ticking their members until the
    /// owning container's reload relocates them.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Number of members currently in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the group holds no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The membership sequence, in tick order.
    #[must_use]
    pub fn members(&self) -> &[ObjectId] {
        &self.members
    }

    /// Effective tick priority: local override, else parent, else
    /// [`DEFAULT_PRIORITY`].
    #[must_use]
    pub fn priority(&self) -> i32 {
        match &self.local {
            Some(local) => local.effective_priority(self.parent.as_ref()),
            None => self
                .parent
                .as_ref()
                .and_then(|p| p.priority)
                .unwrap_or(DEFAULT_PRIORITY),
        }
    }

    /// Effective routed-type set: the local set when non-empty, else the
    /// parent's.
    #[must_use]
    pub fn routed_types(&self) -> &[TypeKey] {
        match &self.local {
            Some(local) => local.effective_routes(self.parent.as_ref()),
            None => self
                .parent
                .as_ref()
                .map(|p| p.routed_types.as_slice())
                .unwrap_or(&[]),
        }
    }

    /// Append a member, returning its slot index.
    pub(crate) fn push(&mut self, object: ObjectId) -> usize {
        self.members.push(object);
        self.members.len() - 1
    }

    /// Remove the member at `slot` in O(1). The last member takes over the
    /// slot; the caller owns the side-table fixup for it.
    pub(crate) fn swap_remove(&mut self, slot: usize) -> ObjectId {
        self.members.swap_remove(slot)
    }

    /// Empty the membership sequence.
    pub(crate) fn clear_members(&mut self) {
        self.members.clear();
    }

    /// Drain the membership sequence, leaving the group empty.
    pub(crate) fn take_members(&mut self) -> Vec<ObjectId> {
        std::mem::take(&mut self.members)
    }

    /// Re-read this group's policy snapshots from the provider.
    ///
    /// A vanished backing entry marks the group invalid unless
    /// `create_if_missing` is set, in which case the entry is considered
    /// freshly recreated from the current snapshot. A vanished parent entry
    /// marks the group invalid regardless — a policy whose parent is invalid
    /// is itself invalid.
    pub(crate) fn read_config(&mut self, provider: &dyn PolicyProvider, create_if_missing: bool) {
        self.valid = true;

        if let Some(local_name) = self.local.as_ref().map(|l| l.name.clone()) {
            match provider.lookup(&local_name) {
                Some(policy) => self.local = Some(policy),
                None if create_if_missing => {}
                None => {
                    debug!(group = self.leaf, "configuration entry gone; group invalid");
                    self.valid = false;
                }
            }
        }

        let parent_name = self
            .local
            .as_ref()
            .and_then(|l| l.parent.clone())
            .or_else(|| self.parent.as_ref().map(|p| p.name.clone()));
        if let Some(name) = parent_name {
            match provider.lookup(&name) {
                Some(policy) => self.parent = Some(policy),
                None => {
                    debug!(group = self.leaf, parent = %name, "parent policy gone; group invalid");
                    self.valid = false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tick_policy::{MemoryPolicyProvider, ObjectKind, PolicyName, WorldId};

    use super::*;

    fn world_policy(leaf: &str) -> GroupPolicy {
        GroupPolicy::new(PolicyName::world(WorldId(0), leaf), ObjectKind::Actor)
    }

    fn global_policy(leaf: &str) -> GroupPolicy {
        GroupPolicy::new(PolicyName::global(leaf), ObjectKind::Actor)
    }

    #[test]
    fn test_push_and_swap_remove() {
        let mut group = TickGroup::from_world_policy(world_policy("monsters"), None);
        assert_eq!(group.push(ObjectId(1)), 0);
        assert_eq!(group.push(ObjectId(2)), 1);
        assert_eq!(group.push(ObjectId(3)), 2);

        // Removing the head swaps the tail into its slot.
        assert_eq!(group.swap_remove(0), ObjectId(1));
        assert_eq!(group.members(), &[ObjectId(3), ObjectId(2)]);
    }

    #[test]
    fn test_take_members_empties_group() {
        let mut group = TickGroup::from_world_policy(world_policy("monsters"), None);
        group.push(ObjectId(1));
        group.push(ObjectId(2));

        let drained = group.take_members();
        assert_eq!(drained, vec![ObjectId(1), ObjectId(2)]);
        assert!(group.is_empty());
    }

    #[test]
    fn test_priority_resolution() {
        let parent = global_policy("monsters").with_priority(3);

        let local_override =
            TickGroup::from_world_policy(world_policy("monsters").with_priority(9), Some(parent.clone()));
        assert_eq!(local_override.priority(), 9);

        let inherited = TickGroup::from_world_policy(world_policy("monsters"), Some(parent.clone()));
        assert_eq!(inherited.priority(), 3);

        let global_clone = TickGroup::from_global_policy(parent);
        assert_eq!(global_clone.priority(), 3);

        let bare = TickGroup::from_world_policy(world_policy("monsters"), None);
        assert_eq!(bare.priority(), DEFAULT_PRIORITY);
    }

    #[test]
    fn test_routed_types_inherit_from_parent() {
        let parent = global_policy("monsters").route("mob.zombie").route("mob.skeleton");
        let group = TickGroup::from_world_policy(world_policy("monsters"), Some(parent));
        assert_eq!(group.routed_types().len(), 2);
    }

    #[test]
    fn test_read_config_marks_invalid_when_entry_gone() {
        let policy = world_policy("monsters");
        let mut provider = MemoryPolicyProvider::new();
        provider.define(policy.clone());

        let mut group = TickGroup::from_world_policy(policy.clone(), None);
        group.read_config(&provider, false);
        assert!(group.is_valid());

        provider.remove(&policy.name);
        group.read_config(&provider, false);
        assert!(!group.is_valid());

        // `create_if_missing` treats the entry as recreated from the snapshot.
        group.read_config(&provider, true);
        assert!(group.is_valid());
    }

    #[test]
    fn test_read_config_invalid_parent_propagates() {
        let parent = global_policy("monsters");
        let local = world_policy("monsters").with_parent(parent.name.clone());

        let mut provider = MemoryPolicyProvider::new();
        provider.define(parent.clone());
        provider.define(local.clone());

        let mut group = TickGroup::from_world_policy(local, Some(parent.clone()));
        group.read_config(&provider, false);
        assert!(group.is_valid());

        // The local entry survives but the parent vanishes: still invalid.
        provider.remove(&parent.name);
        group.read_config(&provider, false);
        assert!(!group.is_valid());
    }

    #[test]
    fn test_read_config_refreshes_snapshot() {
        let policy = world_policy("monsters").with_priority(1);
        let mut provider = MemoryPolicyProvider::new();
        provider.define(policy.clone().with_priority(8));

        let mut group = TickGroup::from_world_policy(policy, None);
        assert_eq!(group.priority(), 1);
        group.read_config(&provider, false);
        assert_eq!(group.priority(), 8);
    }
}
