//! The sharing state machine: pending invitations, accept/decline/cancel
//! transitions, and the visibility rules that decide which rows reach the
//! date index.
//!
//! A share starts `pending`. Accepting forks the snapshot into a brand-new
//! event owned by the recipient and demotes the row to an *accepted marker*
//! (`original_event_id` cleared); markers keep the audit trail but never
//! materialize. Declining keeps the row as a tombstone so the sender can see
//! the outcome; cancelling deletes the row outright.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, ShareError};
use crate::event::CanonicalEvent;

/// Lifecycle state of a shared-event row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareStatus {
    Pending,
    Accepted,
    Declined,
}

impl ShareStatus {
    /// Wire spelling used by stores and transport payloads.
    pub fn as_wire(self) -> &'static str {
        match self {
            ShareStatus::Pending => "pending",
            ShareStatus::Accepted => "accepted",
            ShareStatus::Declined => "declined",
        }
    }

    /// Parse a wire status. Unknown spellings map to `Declined` so that a
    /// row written by a newer peer degrades to invisible instead of wedging
    /// the grid.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "pending" => ShareStatus::Pending,
            "accepted" => ShareStatus::Accepted,
            _ => ShareStatus::Declined,
        }
    }
}

impl fmt::Display for ShareStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// A shared-event row: one sender, one recipient, one frozen snapshot of the
/// event as it looked at share time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedEvent {
    pub id: String,
    /// Id of the sender's canonical event. Cleared on accept, which turns the
    /// row into an accepted marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_event_id: Option<String>,
    pub shared_by: String,
    pub shared_with: String,
    pub status: ShareStatus,
    /// The event as captured when the share was created. Later edits by the
    /// sender do not flow through.
    pub snapshot: CanonicalEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SharedEvent {
    /// Accepted rows whose `original_event_id` was cleared. The recipient's
    /// fork is the live copy; the marker itself never materializes.
    pub fn is_accepted_marker(&self) -> bool {
        self.status == ShareStatus::Accepted && self.original_event_id.is_none()
    }
}

/// Transitions a user can request on a share row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareAction {
    /// Recipient takes the event: fork the snapshot, demote the row.
    Accept,
    /// Recipient refuses: the row stays as a declined tombstone.
    Decline,
    /// Sender withdraws a pending invitation: the row is deleted.
    Cancel,
    /// Recipient removes a previously accepted share from their grid.
    Retract,
}

impl ShareAction {
    pub fn verb(self) -> &'static str {
        match self {
            ShareAction::Accept => "accept",
            ShareAction::Decline => "decline",
            ShareAction::Cancel => "cancel",
            ShareAction::Retract => "retract",
        }
    }
}

/// Check that `actor` may perform `action` on `share` in its current state.
///
/// Accept, decline, and retract belong to the recipient; cancel belongs to
/// the sender. Accept/decline/cancel require a pending row, retract an
/// accepted one.
pub fn authorize(share: &SharedEvent, actor: &str, action: ShareAction) -> Result<()> {
    match action {
        ShareAction::Accept | ShareAction::Decline => {
            if actor != share.shared_with {
                return Err(ShareError::NotRecipient {
                    action: action.verb(),
                });
            }
            require_status(share, action, ShareStatus::Pending)
        }
        ShareAction::Cancel => {
            if actor != share.shared_by {
                return Err(ShareError::NotSender {
                    action: action.verb(),
                });
            }
            require_status(share, action, ShareStatus::Pending)
        }
        ShareAction::Retract => {
            if actor != share.shared_with {
                return Err(ShareError::NotRecipient {
                    action: action.verb(),
                });
            }
            require_status(share, action, ShareStatus::Accepted)
        }
    }
}

fn require_status(share: &SharedEvent, action: ShareAction, expected: ShareStatus) -> Result<()> {
    if share.status != expected {
        return Err(ShareError::WrongStatus {
            action: action.verb(),
            status: share.status,
            expected,
        });
    }
    Ok(())
}

/// Build the recipient's independent copy of an accepted share.
///
/// The fork gets a fresh id and the recipient as owner; everything else is
/// the frozen snapshot verbatim, so recurrence, custom dates, and photos all
/// carry over.
pub fn fork_snapshot(share: &SharedEvent, new_id: &str) -> CanonicalEvent {
    let mut event = share.snapshot.clone();
    event.id = new_id.to_owned();
    event.owner = share.shared_with.clone();
    event
}

/// How a share row presents to a given viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareVisibility {
    /// Sender's view of a still-pending invitation; badges their own event.
    SentPending,
    /// Recipient's view of an accepted share that was never forked locally;
    /// materializes from the snapshot.
    ReceivedAccepted,
    /// Everything else: declined rows, accepted markers, pending rows on the
    /// recipient side, and rows the viewer is not party to.
    Hidden,
}

/// Decide whether `share` contributes to `viewer`'s date index, and how.
///
/// Pending shares are deliberately asymmetric: the sender sees their own
/// event badged, while the recipient sees nothing until they accept.
pub fn visibility(share: &SharedEvent, viewer: &str) -> ShareVisibility {
    match share.status {
        ShareStatus::Pending if viewer == share.shared_by => ShareVisibility::SentPending,
        ShareStatus::Accepted
            if viewer == share.shared_with && share.original_event_id.is_some() =>
        {
            ShareVisibility::ReceivedAccepted
        }
        _ => ShareVisibility::Hidden,
    }
}
