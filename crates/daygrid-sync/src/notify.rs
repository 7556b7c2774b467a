//! Hand-off points to the notification collaborator: local reminder
//! scheduling and "shared with you" pushes.
//!
//! Delivery is not this crate's concern. The methods are fire-and-forget;
//! implementations log or queue failures on their side, and a mutation never
//! fails because a push could not be sent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Why a share push is being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareNoticeKind {
    /// A new pending share was created for the recipient.
    Invited,
    /// The recipient accepted; goes to the original sender.
    Accepted,
    /// The recipient declined; goes to the original sender.
    Declined,
    /// The sender withdrew a pending share; goes to the invitee.
    Cancelled,
}

/// Payload for a share push notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareNotice {
    /// Who receives the push.
    pub recipient_id: String,
    /// Whose action triggered it.
    pub sender_id: String,
    pub event_title: String,
    pub event_id: String,
    pub kind: ShareNoticeKind,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Schedule a reminder under the event's id. A recurring event hands off
    /// several fire instants under the same id; [`Notifier::cancel_reminders`]
    /// clears them all at once.
    async fn schedule_reminder(&self, event_id: &str, title: &str, fire_at: DateTime<Utc>);

    /// Drop every scheduled reminder for the event, called on edit and
    /// delete before any re-scheduling.
    async fn cancel_reminders(&self, event_id: &str);

    async fn share_notice(&self, notice: ShareNotice);
}

/// Discards everything. For callers that render without notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn schedule_reminder(&self, _event_id: &str, _title: &str, _fire_at: DateTime<Utc>) {}

    async fn cancel_reminders(&self, _event_id: &str) {}

    async fn share_notice(&self, _notice: ShareNotice) {}
}
