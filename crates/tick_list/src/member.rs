//! Member handles and the admission predicate.
//!
//! The container never owns host objects. It schedules them through
//! [`ObjectId`] handles; the host allocates handles, keeps them unique, and
//! releases the objects behind them. A [`Member`] pairs a handle with the
//! routing metadata the container needs.

use serde::{Deserialize, Serialize};
use tick_policy::TypeKey;

/// A handle to a host-owned schedulable object.
///
/// Pure identifier — the container attaches grouping state to it but never
/// dereferences it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// Create a handle from a raw `u64` identifier.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Object({})", self.0)
    }
}

/// Insertion record: a host object handle plus the type key routing decides
/// by.
///
/// Created by the host before insertion. The container copies the type key
/// into its membership bookkeeping so the member can be re-routed during a
/// regroup without consulting the host again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// The host object being scheduled.
    pub object: ObjectId,
    /// Runtime type identifier used for group routing.
    pub type_key: TypeKey,
}

impl Member {
    /// Create a member record.
    #[must_use]
    pub fn new(object: ObjectId, type_key: impl Into<TypeKey>) -> Self {
        Self {
            object,
            type_key: type_key.into(),
        }
    }
}

/// Host predicate consulted before a member is admitted into the schedule.
///
/// Hosts use this to reject objects that are not independently schedulable —
/// sub-parts whose ticking is driven by another object already in the list.
pub trait AdmissionPolicy {
    /// Returns `false` to reject the member at `add` time.
    fn is_independently_schedulable(&self, member: &Member) -> bool;
}

/// Default admission policy: every member is schedulable.
#[derive(Debug, Default, Clone, Copy)]
pub struct AdmitAll;

impl AdmissionPolicy for AdmitAll {
    fn is_independently_schedulable(&self, _member: &Member) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_roundtrip() {
        let id = ObjectId::from_raw(42);
        assert_eq!(id.id(), 42);
        assert_eq!(id.to_string(), "Object(42)");
    }

    #[test]
    fn test_member_construction() {
        let member = Member::new(ObjectId(7), "mob.zombie");
        assert_eq!(member.object, ObjectId(7));
        assert_eq!(member.type_key, TypeKey::from("mob.zombie"));
    }

    #[test]
    fn test_admit_all() {
        let member = Member::new(ObjectId(1), "mob.zombie");
        assert!(AdmitAll.is_independently_schedulable(&member));
    }
}
