//! Container error types.

use tick_policy::ObjectKind;

/// Errors surfaced by the scheduling container and its cursors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TickListError {
    /// No policy defines the fallback ("ungrouped") group for this kind.
    ///
    /// Raised at construction, and by `reload` before anything is touched.
    /// Every container requires the fallback group to exist — this is a
    /// configuration/programming invariant, not a recoverable condition.
    #[error("no `{}` fallback group is defined for this {kind} list", .kind.fallback_group())]
    MissingFallbackGroup {
        /// The object-type domain of the container.
        kind: ObjectKind,
    },

    /// The operation has no use in the tick-loop access pattern and is
    /// deliberately unimplemented rather than emulated slowly.
    #[error("unsupported sequence operation: {0}")]
    Unsupported(&'static str),

    /// The list changed structurally while a cursor was mid-pass.
    ///
    /// The container itself remains valid; only the cursor is dead.
    #[error(
        "list changed during iteration (cursor created at generation {created}, list is at {current})"
    )]
    ConcurrentModification {
        /// Generation captured when the cursor was created.
        created: u64,
        /// The container's generation at the failing step.
        current: u64,
    },
}
