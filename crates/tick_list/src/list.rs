//! The grouped tick-scheduling sequence.
//!
//! [`TickList`] replaces the host engine's flat "tick every active object
//! every frame" list. Outwardly it behaves as an indexable sequence; inwardly
//! members are partitioned into [`TickGroup`]s by runtime type so each group
//! can carry its own tick policy. The sequence contract it keeps, and the
//! operations it refuses, follow the access pattern of a host tick loop:
//! append, remove-by-object, full forward passes — not random access.
//!
//! ## Index stability
//!
//! `get` and `index_of` walk the group sequence accumulating per-group
//! counts. Group order is insertion order and member order inside a group is
//! disturbed by swap-removal, so **indices must not be cached across
//! structural mutations**. This is a documented property of the container,
//! inherited from the access pattern it is optimized for.

use std::collections::HashMap;

use serde::Serialize;
use tick_policy::{ObjectKind, PolicyName, PolicyProvider, TypeKey, WorldId};
use tracing::{debug, error, info, warn};

use crate::cursor::{BudgetCursor, FrameBudget, SkipOrder, TickCursor};
use crate::error::TickListError;
use crate::group::{GroupId, GroupOrigin, TickGroup};
use crate::member::{AdmissionPolicy, AdmitAll, Member, ObjectId};
use crate::router::ClassRouter;

/// Side-table entry for one grouped member.
///
/// Exists exactly while the object is in the list. `group` and `slot` locate
/// the member for O(1) removal; `type_key` lets a regroup re-route the member
/// without consulting the host.
#[derive(Debug)]
struct MemberRecord {
    group: GroupId,
    slot: usize,
    type_key: TypeKey,
}

/// Snapshot of one group's state, for operator diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    /// The group's leaf name.
    pub name: String,
    /// Where the group's definition came from.
    pub origin: GroupOrigin,
    /// Current member count.
    pub members: usize,
    /// Effective tick priority.
    pub priority: i32,
    /// Whether the backing configuration still exists.
    pub valid: bool,
}

/// The grouped scheduling sequence for one world and object kind.
pub struct TickList {
    world: WorldId,
    kind: ObjectKind,
    /// Insertion-ordered group sequence. Order is load-bearing: it fixes
    /// positional indexing and plain-cursor traversal order.
    groups: Vec<TickGroup>,
    router: ClassRouter,
    records: HashMap<ObjectId, MemberRecord>,
    fallback: GroupId,
    len: usize,
    /// Bumped on structural shrink and reload, never on append.
    generation: u64,
    admission: Box<dyn AdmissionPolicy>,
}

impl std::fmt::Debug for TickList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickList")
            .field("world", &self.world)
            .field("kind", &self.kind)
            .field("groups", &self.groups)
            .field("len", &self.len)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl TickList {
    /// Build the list for one world and object kind, admitting every member.
    ///
    /// Loads every world-scoped policy for the `(world, kind)` pair, then
    /// every global policy of the kind not already present by leaf name
    /// (globals become local groups inheriting the global's settings, not
    /// its membership), designates the fallback group, and builds the
    /// router.
    ///
    /// # Errors
    ///
    /// [`TickListError::MissingFallbackGroup`] if no policy defines the
    /// kind's fallback group. Construction cannot proceed without it.
    pub fn new(
        world: WorldId,
        kind: ObjectKind,
        provider: &dyn PolicyProvider,
    ) -> Result<Self, TickListError> {
        Self::with_admission(world, kind, provider, Box::new(AdmitAll))
    }

    /// Build the list with a host-supplied admission predicate.
    ///
    /// # Errors
    ///
    /// See [`TickList::new`].
    pub fn with_admission(
        world: WorldId,
        kind: ObjectKind,
        provider: &dyn PolicyProvider,
        admission: Box<dyn AdmissionPolicy>,
    ) -> Result<Self, TickListError> {
        let mut list = Self {
            world,
            kind,
            groups: Vec::new(),
            router: ClassRouter::default(),
            records: HashMap::new(),
            fallback: GroupId(0),
            len: 0,
            generation: 0,
            admission,
        };

        list.load_world_groups(provider);
        list.load_global_groups(provider);

        list.fallback = list
            .find_group(kind.fallback_group())
            .ok_or(TickListError::MissingFallbackGroup { kind })?;
        list.router.rebuild(&list.groups);

        info!(
            world = %world,
            kind = %kind,
            groups = list.groups.len(),
            routed_types = list.router.len(),
            "initialized tick list"
        );
        Ok(list)
    }

    /// Load world-scoped groups not already present by leaf name.
    fn load_world_groups(&mut self, provider: &dyn PolicyProvider) {
        for policy in provider.world_policies(self.world, self.kind) {
            if self.find_group(policy.name.leaf()).is_some() {
                continue;
            }
            // Parent: the explicitly named policy, else the same-leaf global.
            let parent = policy
                .parent
                .clone()
                .or_else(|| Some(PolicyName::global(policy.name.leaf())))
                .and_then(|name| provider.lookup(&name))
                .filter(|p| p.kind == self.kind);
            debug!(group = policy.name.leaf(), policy = %policy.name, "load world group");
            self.groups.push(TickGroup::from_world_policy(policy, parent));
        }
    }

    /// Clone global groups not already present by leaf name.
    fn load_global_groups(&mut self, provider: &dyn PolicyProvider) {
        for policy in provider.global_policies(self.kind) {
            if self.find_group(policy.name.leaf()).is_some() {
                continue;
            }
            debug!(group = policy.name.leaf(), policy = %policy.name, "load global group");
            self.groups.push(TickGroup::from_global_policy(policy));
        }
    }

    fn find_group(&self, leaf: &str) -> Option<GroupId> {
        self.groups.iter().position(|g| g.leaf() == leaf).map(GroupId)
    }

    /// The world this list is bound to.
    #[must_use]
    pub fn world(&self) -> WorldId {
        self.world
    }

    /// The object-type domain this list schedules.
    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Total number of scheduled members, across all groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no members are scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The structural-mutation counter cursors validate against.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of groups, including the fallback group.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Iterate the groups in insertion order.
    pub fn groups(&self) -> impl Iterator<Item = &TickGroup> {
        self.groups.iter()
    }

    /// The group holding members no policy routes.
    #[must_use]
    pub fn fallback_group(&self) -> &TickGroup {
        &self.groups[self.fallback.0]
    }

    pub(crate) fn group_at(&self, index: usize) -> &TickGroup {
        &self.groups[index]
    }

    /// Add a member to the schedule.
    ///
    /// Routes through the class router, falling back to the fallback group
    /// for unrouted types. Returns `false` — without touching anything — if
    /// the object is already scheduled or the admission predicate rejects
    /// it.
    ///
    /// Appending never bumps the generation counter: cursors mid-pass stay
    /// valid, and a cursor already past the append point will not observe
    /// the new member this pass.
    pub fn add(&mut self, member: Member) -> bool {
        if self.records.contains_key(&member.object) {
            return false;
        }
        if !self.admission.is_independently_schedulable(&member) {
            debug!(object = %member.object, type_key = %member.type_key, "member not independently schedulable; rejected");
            return false;
        }
        self.place(member);
        true
    }

    /// Positional insertion is not meaningful for a grouped schedule: the
    /// index is ignored and the member appended. Hosts only ever call this
    /// with the tail index.
    pub fn insert(&mut self, _index: usize, member: Member) -> bool {
        self.add(member)
    }

    /// Add every member of the iterator; returns how many were admitted.
    pub fn add_all(&mut self, members: impl IntoIterator<Item = Member>) -> usize {
        members.into_iter().filter(|m| self.add(m.clone())).count()
    }

    /// Route a member into its group and record it. Shared by `add` and the
    /// regroup path; admission has already been decided by the caller.
    fn place(&mut self, member: Member) {
        let Member { object, type_key } = member;
        let group = self.router.resolve(&type_key).unwrap_or(self.fallback);
        let slot = self.groups[group.0].push(object);
        self.records.insert(
            object,
            MemberRecord {
                group,
                slot,
                type_key,
            },
        );
        self.len += 1;
    }

    /// Returns `true` if the object is currently scheduled by this list.
    #[must_use]
    pub fn contains(&self, object: ObjectId) -> bool {
        self.records.contains_key(&object)
    }

    /// Returns `true` if every object of the iterator is scheduled.
    pub fn contains_all(&self, objects: impl IntoIterator<Item = ObjectId>) -> bool {
        objects.into_iter().all(|object| self.contains(object))
    }

    /// Remove a member from the schedule.
    ///
    /// O(1): the side table locates the member's slot, and the group's last
    /// member swaps into it (member order within a group is not preserved).
    /// Structural shrink — bumps the generation counter, invalidating
    /// in-flight cursors and cached indices.
    pub fn remove(&mut self, object: ObjectId) -> bool {
        let Some(record) = self.records.remove(&object) else {
            return false;
        };

        let group = &mut self.groups[record.group.0];
        if group.members().get(record.slot) != Some(&object) {
            // Ownership symmetry is broken. Refuse the mutation and leave
            // the record in place; this is a defect in the container, not
            // caller error.
            error!(
                object = %object,
                group = group.leaf(),
                slot = record.slot,
                "membership slot does not hold the object being removed"
            );
            self.records.insert(object, record);
            return false;
        }

        group.swap_remove(record.slot);
        if let Some(&moved) = group.members().get(record.slot)
            && let Some(moved_record) = self.records.get_mut(&moved)
        {
            moved_record.slot = record.slot;
        }

        self.len -= 1;
        self.generation += 1;
        true
    }

    /// Remove the member at a positional index. Slow path: resolves the
    /// index by walking the group sequence first.
    pub fn remove_at(&mut self, index: usize) -> Option<ObjectId> {
        warn!(index, "removal by positional index walks the group set; prefer removal by object");
        let object = self.get(index)?;
        self.remove(object).then_some(object)
    }

    /// Remove every object of the iterator; returns how many were removed.
    pub fn remove_all(&mut self, objects: impl IntoIterator<Item = ObjectId>) -> usize {
        objects.into_iter().filter(|&object| self.remove(object)).count()
    }

    /// Remove every member from every group.
    pub fn clear(&mut self) {
        for group in &mut self.groups {
            group.clear_members();
        }
        self.records.clear();
        self.len = 0;
        self.generation += 1;
        debug!(world = %self.world, kind = %self.kind, "cleared all scheduled objects");
    }

    /// The member at a positional index.
    ///
    /// O(groups): walks the group sequence accumulating counts. Indices are
    /// not stable across structural mutation.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<ObjectId> {
        if index >= self.len {
            return None;
        }
        let mut offset = 0;
        for group in &self.groups {
            if index < offset + group.len() {
                return group.members().get(index - offset).copied();
            }
            offset += group.len();
        }
        None
    }

    /// The positional index of a scheduled member, under the same walk as
    /// [`TickList::get`].
    #[must_use]
    pub fn index_of(&self, object: ObjectId) -> Option<usize> {
        let record = self.records.get(&object)?;
        let mut offset = 0;
        for (index, group) in self.groups.iter().enumerate() {
            if index == record.group.0 {
                return Some(offset + record.slot);
            }
            offset += group.len();
        }
        None
    }

    /// Flatten the schedule into one sequence, in group-iteration order.
    ///
    /// Diagnostics/compatibility path only — never the hot tick loop.
    #[must_use]
    pub fn to_vec(&self) -> Vec<ObjectId> {
        debug!(len = self.len, "flattening grouped schedule (slow path)");
        let mut all = Vec::with_capacity(self.len);
        for group in &self.groups {
            all.extend_from_slice(group.members());
        }
        all
    }

    /// A plain forward cursor over the whole schedule, in positional-index
    /// order.
    #[must_use]
    pub fn cursor(&self) -> TickCursor {
        TickCursor::new(self)
    }

    /// A budget-aware cursor that defers remaining groups once the host's
    /// frame budget signal trips, visiting higher-priority groups first.
    #[must_use]
    pub fn budget_cursor<'s>(&self, signal: &'s dyn FrameBudget) -> BudgetCursor<'s> {
        BudgetCursor::new(self, signal, SkipOrder::default())
    }

    /// A budget-aware cursor with an explicit group visit order.
    #[must_use]
    pub fn budget_cursor_with_order<'s>(
        &self,
        signal: &'s dyn FrameBudget,
        order: SkipOrder,
    ) -> BudgetCursor<'s> {
        BudgetCursor::new(self, signal, order)
    }

    /// Re-create groups from configuration and redistribute every member.
    ///
    /// The regroup transaction: drain all members into a flat sequence,
    /// drop groups whose policy (or parent policy) vanished, re-read the
    /// survivors' configuration, pick up newly defined groups, rebuild the
    /// router, and re-route every drained member. Admission is not
    /// re-checked — members were admitted once.
    ///
    /// Atomic from a caller's perspective: the one fallible condition (the
    /// fallback group disappearing from configuration) is checked before
    /// any member is drained, so an `Err` leaves the container untouched.
    /// The generation counter moves exactly once for the whole transaction.
    ///
    /// # Errors
    ///
    /// [`TickListError::MissingFallbackGroup`] if the provider no longer
    /// defines the kind's fallback group.
    pub fn reload(&mut self, provider: &dyn PolicyProvider) -> Result<(), TickListError> {
        let fallback_leaf = self.kind.fallback_group();
        let world_policies = provider.world_policies(self.world, self.kind);
        let global_policies = provider.global_policies(self.kind);
        let fallback_defined = world_policies
            .iter()
            .chain(global_policies.iter())
            .any(|p| p.name.leaf() == fallback_leaf);
        if !fallback_defined {
            return Err(TickListError::MissingFallbackGroup { kind: self.kind });
        }

        // Drain every group into a flat sequence; the side table supplies
        // the routing key each member re-enters with.
        let mut drained: Vec<Member> = Vec::with_capacity(self.len);
        for group in &mut self.groups {
            for object in group.take_members() {
                match self.records.remove(&object) {
                    Some(record) => drained.push(Member::new(object, record.type_key)),
                    None => error!(object = %object, "object had no membership record during regroup"),
                }
            }
        }
        self.records.clear();
        self.len = 0;

        // Re-read configuration; groups whose entry (or parent) vanished
        // dissolve here, members already safe in the drained sequence.
        for group in &mut self.groups {
            group.read_config(provider, false);
        }
        let before = self.groups.len();
        self.groups.retain(|group| {
            if !group.is_valid() {
                debug!(group = group.leaf(), "dropping group with removed configuration");
            }
            group.is_valid()
        });
        let dropped = before - self.groups.len();

        // Construction steps again: new groups, fallback, router.
        self.load_world_groups(provider);
        self.load_global_groups(provider);
        self.fallback = self
            .find_group(fallback_leaf)
            .ok_or(TickListError::MissingFallbackGroup { kind: self.kind })?;
        self.router.rebuild(&self.groups);

        let moved = drained.len();
        for member in drained {
            self.place(member);
        }

        self.generation += 1;
        info!(
            world = %self.world,
            kind = %self.kind,
            groups = self.groups.len(),
            dropped,
            members = moved,
            "reloaded tick groups"
        );
        Ok(())
    }

    /// Per-group state snapshots, in group-iteration order.
    #[must_use]
    pub fn group_summaries(&self) -> Vec<GroupSummary> {
        self.groups
            .iter()
            .map(|group| GroupSummary {
                name: group.leaf().to_string(),
                origin: group.origin(),
                members: group.len(),
                priority: group.priority(),
                valid: group.is_valid(),
            })
            .collect()
    }

    /// The current type-to-group mapping, sorted for stable display.
    #[must_use]
    pub fn routing_table(&self) -> Vec<(TypeKey, String)> {
        let mut table: Vec<_> = self
            .router
            .entries()
            .map(|(key, group)| (key.clone(), self.groups[group.0].leaf().to_string()))
            .collect();
        table.sort();
        table
    }

    /// Emit the container's state at debug verbosity, for operator
    /// debugging. A no-op unless the `debug` level is enabled.
    pub fn log_diagnostics(&self) {
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }
        debug!(
            world = %self.world,
            kind = %self.kind,
            members = self.len,
            generation = self.generation,
            "tick list state"
        );
        for summary in self.group_summaries() {
            debug!(
                group = summary.name,
                members = summary.members,
                priority = summary.priority,
                valid = summary.valid,
                "group state"
            );
        }
        for (key, group) in self.routing_table() {
            debug!(type_key = %key, group, "route");
        }
    }
}

/// Sequence operations with no use in the tick-loop access pattern. They
/// fail with [`TickListError::Unsupported`] instead of degrading into slow
/// emulations.
impl TickList {
    /// Replacing the member at an index is unsupported.
    pub fn replace_at(
        &mut self,
        _index: usize,
        _member: Member,
    ) -> Result<ObjectId, TickListError> {
        Err(TickListError::Unsupported("replace_at"))
    }

    /// Range views over the grouped schedule are unsupported.
    pub fn sublist(&self, _range: std::ops::Range<usize>) -> Result<Vec<ObjectId>, TickListError> {
        Err(TickListError::Unsupported("sublist"))
    }

    /// Bulk retention is unsupported.
    pub fn retain_where(
        &mut self,
        _keep: &mut dyn FnMut(ObjectId) -> bool,
    ) -> Result<usize, TickListError> {
        Err(TickListError::Unsupported("retain_where"))
    }

    /// Reverse traversal is unsupported.
    pub fn cursor_rev(&self) -> Result<TickCursor, TickListError> {
        Err(TickListError::Unsupported("cursor_rev"))
    }
}
