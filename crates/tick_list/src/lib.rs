//! # tick_list
//!
//! A grouped, reconfigurable tick-scheduling container. Drop-in replacement
//! for a host engine's flat per-frame tick list: outwardly an indexable
//! sequence, inwardly a set of named groups partitioned by object runtime
//! type, each carrying its own tick policy so expensive object classes can
//! be throttled or prioritized independently.
//!
//! This crate provides:
//!
//! - [`TickList`] — the scheduling sequence: membership, routing, positional
//!   access, live reconfiguration via [`TickList::reload`].
//! - [`TickGroup`] — one live group: policy snapshot plus ordered membership.
//! - [`ClassRouter`] — derived type-to-group mapping.
//! - [`TickCursor`] / [`BudgetCursor`] — plain and budget-aware iteration,
//!   fail-fast under concurrent structural mutation.
//! - [`Member`] / [`ObjectId`] — handles to host-owned objects.
//! - [`AdmissionPolicy`] / [`FrameBudget`] — the host collaborator seams.

pub mod cursor;
pub mod error;
pub mod group;
pub mod list;
pub mod member;
pub mod router;

pub use cursor::{BudgetCursor, FrameBudget, SkipOrder, TickCursor};
pub use error::TickListError;
pub use group::{GroupId, GroupOrigin, TickGroup};
pub use list::{GroupSummary, TickList};
pub use member::{AdmissionPolicy, AdmitAll, Member, ObjectId};
pub use router::ClassRouter;
