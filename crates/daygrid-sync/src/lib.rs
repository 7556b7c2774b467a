//! # daygrid-sync
//!
//! Async orchestration around [`daygrid_core`]: fetching the own / accepted /
//! sent-pending streams from an event store, rebuilding the date index,
//! running mutations store-write-first, and handing reminders and share
//! pushes to the notification collaborator.
//!
//! ## Modules
//!
//! - [`service`]: [`service::CalendarService`], the per-user entry point
//! - [`store`]: the [`store::EventStore`] boundary trait
//! - [`memory`]: in-memory store for tests and demos
//! - [`notify`]: reminder and share-push hand-off
//! - [`changes`]: remote change notifications and refetch policy
//! - [`context`]: explicit per-client state (user id, refresh debounce)
//! - [`error`]: store and service error types

pub mod changes;
pub mod context;
pub mod error;
pub mod memory;
pub mod notify;
pub mod service;
pub mod store;

pub use changes::{should_refetch, ChangeOutcome, StoreChange};
pub use context::{RefreshDebounce, SyncContext, DEBOUNCE_WINDOW};
pub use error::{Result, StoreError, SyncError};
pub use memory::MemoryStore;
pub use notify::{NoopNotifier, Notifier, ShareNotice, ShareNoticeKind};
pub use service::{CalendarService, PendingInvite, BOUNDED_WAIT};
pub use store::{EventStore, Profile};
