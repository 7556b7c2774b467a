//! Remote change notifications for the current user's `events` rows.

use serde::{Deserialize, Serialize};

/// One change pushed by the store's subscription stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreChange {
    Insert { event_id: String },
    Update { event_id: String },
    Delete { event_id: String },
}

/// What the service did with a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// The index was rebuilt from a fresh fetch.
    Refetched,
    /// A refresh ran moments ago; this change rode along with it.
    Coalesced,
    /// Delete notifications never trigger a refetch.
    Ignored,
}

/// Whether a change warrants a refetch.
///
/// Deletes are ignored on purpose: an optimistic local removal would be
/// resurrected if the delete notification raced the server confirmation and
/// triggered a refetch of not-yet-deleted rows.
pub fn should_refetch(change: &StoreChange) -> bool {
    !matches!(change, StoreChange::Delete { .. })
}
