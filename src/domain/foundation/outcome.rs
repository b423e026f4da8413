//! Outcome of applying a reconciliation fact to an aggregate.

/// Result of feeding a processor fact through a transition function.
///
/// Stale facts are facts whose source timestamp does not advance the
/// subject's watermark. They are dropped without side effects and are not
/// errors: an out-of-order webhook describing an earlier processor state
/// than what has already been applied is expected under at-least-once,
/// unordered delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactOutcome {
    /// The fact advanced the watermark and its effects were applied.
    Applied,
    /// The fact was older than (or equal to) the watermark and was dropped.
    Stale,
}

impl FactOutcome {
    /// True if the fact was applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, FactOutcome::Applied)
    }
}
