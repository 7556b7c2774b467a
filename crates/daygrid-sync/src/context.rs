//! Explicit per-client state: the viewing user and the refresh debounce.
//!
//! Everything that would otherwise be ambient (current user id, in-flight
//! debounce timestamps) travels in one struct handed to the service, so two
//! service instances never share hidden state.

use std::time::{Duration, Instant};

/// How long after a refresh further change notifications coalesce.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(250);

/// Leading-edge debounce: the first mark in a window runs, the rest coalesce.
///
/// Time is injected by the caller, which keeps the policy testable without
/// sleeping.
#[derive(Debug, Clone)]
pub struct RefreshDebounce {
    window: Duration,
    last: Option<Instant>,
}

impl RefreshDebounce {
    pub fn new(window: Duration) -> Self {
        RefreshDebounce { window, last: None }
    }

    /// Record an attempt at `now`. Returns whether the caller should run the
    /// refresh or let it coalesce with the one just done.
    pub fn mark(&mut self, now: Instant) -> bool {
        match self.last {
            Some(previous) if now.duration_since(previous) < self.window => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for RefreshDebounce {
    fn default() -> Self {
        RefreshDebounce::new(DEBOUNCE_WINDOW)
    }
}

/// The per-client context the service runs under.
#[derive(Debug, Clone)]
pub struct SyncContext {
    /// The viewing user; decides ownership checks and share visibility.
    pub user_id: String,
    pub debounce: RefreshDebounce,
}

impl SyncContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        SyncContext {
            user_id: user_id.into(),
            debounce: RefreshDebounce::default(),
        }
    }
}
