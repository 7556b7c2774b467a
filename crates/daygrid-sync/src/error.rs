//! Error types for the store boundary and the service surface built on it.

use daygrid_core::ShareError;
use std::time::Duration;
use thiserror::Error;

/// Failures reported by an [`crate::store::EventStore`] implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The addressed row does not exist, including rows deleted concurrently
    /// by another client.
    #[error("row not found")]
    NotFound,

    /// Transient transport or auth failure; retrying may succeed.
    #[error("store unreachable: {0}")]
    Unavailable(String),

    /// The store understood the request and refused it.
    #[error("store rejected the request: {0}")]
    Rejected(String),
}

/// Failures surfaced by [`crate::service::CalendarService`].
#[derive(Error, Debug)]
pub enum SyncError {
    /// A read failed; the previously built index stays in place.
    #[error("unable to load calendar data")]
    Load(#[source] StoreError),

    /// A write failed; no local state was mutated.
    #[error("store write failed")]
    Store(#[source] StoreError),

    /// The event belongs to another user. Raised before any store write.
    #[error("event belongs to another user")]
    NotOwner,

    #[error(transparent)]
    Share(#[from] ShareError),

    /// The share row vanished mid-flow, e.g. the sender cancelled while the
    /// recipient was accepting.
    #[error("share is no longer available")]
    ShareUnavailable,

    /// The store did not answer within the bounded wait.
    #[error("store did not respond within {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, SyncError>;
