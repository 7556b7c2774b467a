//! The event-store boundary: async CRUD over the `events` and
//! `shared_events` tables plus profile lookups for display names.
//!
//! Implementations talk to whatever backs the store, a remote relational
//! service in production or [`crate::memory::MemoryStore`] in tests. The
//! service layer owns all policy; implementations only move records.

use async_trait::async_trait;
use daygrid_core::{EventRecord, ShareStatus, SharedEventRecord};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Minimal user profile used to annotate shared occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Async CRUD over the two logical tables.
///
/// All calls are non-blocking suspension points; the engine has no internal
/// threads and relies on the caller's event loop.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// All canonical events owned by `user_id`.
    async fn events_for(&self, user_id: &str) -> Result<Vec<EventRecord>, StoreError>;

    async fn insert_event(&self, record: EventRecord) -> Result<(), StoreError>;

    /// Replace an existing row. `NotFound` when the row is already gone.
    async fn update_event(&self, record: EventRecord) -> Result<(), StoreError>;

    /// Delete an event row and, in the same operation, every `shared_events`
    /// row referencing it regardless of status. The cascade lives here so no
    /// caller has to remember to sequence two deletes.
    async fn delete_event(&self, event_id: &str) -> Result<(), StoreError>;

    /// Shares addressed to `user_id` with the given status.
    async fn shares_received(
        &self,
        user_id: &str,
        status: ShareStatus,
    ) -> Result<Vec<SharedEventRecord>, StoreError>;

    /// Shares created by `user_id` with the given status.
    async fn shares_sent(
        &self,
        user_id: &str,
        status: ShareStatus,
    ) -> Result<Vec<SharedEventRecord>, StoreError>;

    async fn share_by_id(&self, share_id: &str) -> Result<SharedEventRecord, StoreError>;

    async fn insert_share(&self, record: SharedEventRecord) -> Result<(), StoreError>;

    async fn update_share(&self, record: SharedEventRecord) -> Result<(), StoreError>;

    async fn delete_share(&self, share_id: &str) -> Result<(), StoreError>;

    async fn profile(&self, user_id: &str) -> Result<Profile, StoreError>;
}
