//! The calendar service: store-write-first mutations, index refresh, sharing
//! flows, and reminder hand-off, all for one viewing user.
//!
//! Write discipline: every mutation applies the store write first and
//! touches local state only on success, so the index never diverges from the
//! store by more than one confirmed write. Reads that fail leave the old
//! index in place.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use daygrid_core::{
    authorize, build_index, fork_snapshot, materialize, CanonicalEvent, DateIndex, EventRecord,
    ShareAction, ShareAnnotation, ShareDirection, ShareError, ShareStatus, SharedEvent,
    SharedEventRecord, SharedSnapshot,
};

use crate::changes::{should_refetch, ChangeOutcome, StoreChange};
use crate::context::SyncContext;
use crate::error::{Result, StoreError, SyncError};
use crate::notify::{Notifier, ShareNotice, ShareNoticeKind};
use crate::store::EventStore;

/// How long an accept or decline flow waits on the store before reporting it
/// unreachable.
pub const BOUNDED_WAIT: Duration = Duration::from_secs(5);

/// A pending invitation surfaced outside the calendar grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingInvite {
    pub share_id: String,
    pub shared_by: String,
    pub shared_by_display_name: Option<String>,
    pub shared_by_avatar: Option<String>,
    /// The event as snapshotted at share time.
    pub event: CanonicalEvent,
    pub received_at: Option<chrono::DateTime<Utc>>,
}

/// Orchestrates one user's calendar against a store and a notifier.
pub struct CalendarService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    context: SyncContext,
    index: DateIndex,
    own_events: Vec<CanonicalEvent>,
}

impl<S: EventStore, N: Notifier> CalendarService<S, N> {
    pub fn new(store: Arc<S>, notifier: Arc<N>, user_id: impl Into<String>) -> Self {
        CalendarService {
            store,
            notifier,
            context: SyncContext::new(user_id),
            index: DateIndex::new(),
            own_events: Vec::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.context.user_id
    }

    /// The current date index. Swapped whole on refresh, never observable
    /// half-built.
    pub fn index(&self) -> &DateIndex {
        &self.index
    }

    pub fn own_events(&self) -> &[CanonicalEvent] {
        &self.own_events
    }

    /// Fetch the three streams and rebuild the index from scratch.
    ///
    /// Runs on initial load, pull-to-refresh, and coalesced change
    /// notifications. The three fetches are separate queries with no
    /// transactional guarantee between them; rows caught mid-transition are
    /// filtered by the visibility rules and converge next refresh.
    pub async fn refresh(&mut self) -> Result<()> {
        let user = self.context.user_id.clone();

        let events = self.store.events_for(&user).await.map_err(SyncError::Load)?;
        let accepted = self
            .store
            .shares_received(&user, ShareStatus::Accepted)
            .await
            .map_err(SyncError::Load)?;
        let sent_pending = self
            .store
            .shares_sent(&user, ShareStatus::Pending)
            .await
            .map_err(SyncError::Load)?;

        let own: Vec<CanonicalEvent> = events.into_iter().map(EventRecord::into_event).collect();
        let accepted = self.enrich(accepted).await;
        let sent_pending = self.enrich(sent_pending).await;

        debug!(
            own = own.len(),
            accepted = accepted.len(),
            sent_pending = sent_pending.len(),
            "rebuilding date index"
        );

        let index = build_index(&own, &accepted, &sent_pending, &user);
        self.own_events = own;
        self.index = index;
        Ok(())
    }

    /// Attach sender profiles to share rows. Lookups are best-effort; a
    /// failed lookup annotates without a display name.
    async fn enrich(&self, records: Vec<SharedEventRecord>) -> Vec<SharedSnapshot> {
        let mut snapshots = Vec::with_capacity(records.len());
        for record in records {
            let mut snapshot = SharedSnapshot::new(record.into_share());
            match self.store.profile(&snapshot.share.shared_by).await {
                Ok(profile) => {
                    snapshot.shared_by_display_name = profile.display_name;
                    snapshot.shared_by_avatar = profile.avatar_url;
                }
                Err(err) => {
                    warn!(user = %snapshot.share.shared_by, error = %err, "profile lookup failed");
                }
            }
            snapshots.push(snapshot);
        }
        snapshots
    }

    // -- event mutations ----------------------------------------------------

    /// Create an event owned by the current user. An empty id is filled with
    /// a fresh one; an empty owner with the current user.
    pub async fn create_event(&mut self, mut event: CanonicalEvent) -> Result<CanonicalEvent> {
        if event.owner.is_empty() {
            event.owner = self.context.user_id.clone();
        } else if event.owner != self.context.user_id {
            return Err(SyncError::NotOwner);
        }
        if event.id.is_empty() {
            event.id = Uuid::new_v4().to_string();
        }

        self.store
            .insert_event(EventRecord::from_event(&event))
            .await
            .map_err(SyncError::Store)?;

        self.apply_local_upsert(event.clone());
        self.hand_off_reminders(&event).await;
        Ok(event)
    }

    /// Update an owned event. Returns `Ok(None)` when the row was already
    /// deleted elsewhere; the stale occurrences are still cleaned up locally.
    ///
    /// Ownership is confirmed before the write reaches the store: against
    /// the local cache when warm, against the store's own rows when cold.
    pub async fn update_event(&mut self, event: CanonicalEvent) -> Result<Option<CanonicalEvent>> {
        if event.owner != self.context.user_id {
            return Err(SyncError::NotOwner);
        }
        if !self.owns_locally(&event.id) {
            self.owned_event(&event.id).await?;
        }

        match self.store.update_event(EventRecord::from_event(&event)).await {
            Ok(()) => {
                self.apply_local_upsert(event.clone());
                self.hand_off_reminders(&event).await;
                Ok(Some(event))
            }
            Err(StoreError::NotFound) => {
                self.purge_local(&event.id).await;
                Ok(None)
            }
            Err(err) => Err(SyncError::Store(err)),
        }
    }

    /// Delete an owned event. The store cascades its share rows; a row that
    /// went missing after ownership was confirmed still counts as success
    /// for local cleanup.
    pub async fn delete_event(&mut self, event_id: &str) -> Result<()> {
        if !self.owns_locally(event_id) {
            self.owned_event(event_id).await?;
        }

        match self.store.delete_event(event_id).await {
            Ok(()) | Err(StoreError::NotFound) => {
                self.purge_local(event_id).await;
                Ok(())
            }
            Err(err) => Err(SyncError::Store(err)),
        }
    }

    // -- sharing flows ------------------------------------------------------

    /// Share an owned event with each recipient: one pending row per friend,
    /// each freezing the event as it stands now. The sender's own
    /// occurrences pick up a sent-pending badge immediately.
    pub async fn share_event(
        &mut self,
        event_id: &str,
        recipients: &[String],
    ) -> Result<Vec<SharedEvent>> {
        let user = self.context.user_id.clone();
        if recipients.iter().any(|recipient| recipient == &user) {
            return Err(ShareError::SelfShare.into());
        }
        let event = self.owned_event(event_id).await?;

        let now = Utc::now();
        let mut created = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            let share = SharedEvent {
                id: Uuid::new_v4().to_string(),
                original_event_id: Some(event.id.clone()),
                shared_by: user.clone(),
                shared_with: recipient.clone(),
                status: ShareStatus::Pending,
                snapshot: event.clone(),
                created_at: Some(now),
                updated_at: Some(now),
            };
            self.store
                .insert_share(SharedEventRecord::from_share(&share))
                .await
                .map_err(SyncError::Store)?;
            self.notifier
                .share_notice(ShareNotice {
                    recipient_id: recipient.clone(),
                    sender_id: user.clone(),
                    event_title: event.title.clone(),
                    event_id: event.id.clone(),
                    kind: ShareNoticeKind::Invited,
                })
                .await;
            created.push(share);
        }

        let annotation = ShareAnnotation {
            status: ShareStatus::Pending,
            direction: ShareDirection::Sent,
            shared_by: user,
            shared_by_display_name: None,
            shared_by_avatar: None,
        };
        self.index.extend(
            materialize(&event)
                .into_iter()
                .map(|occurrence| occurrence.with_sharing(annotation.clone())),
        );
        Ok(created)
    }

    /// Accept a pending share addressed to the current user: fork the
    /// snapshot into an independent owned event, demote the share row to an
    /// accepted marker, and notify the sender. Bounded by [`BOUNDED_WAIT`].
    pub async fn accept_share(&mut self, share_id: &str) -> Result<CanonicalEvent> {
        match tokio::time::timeout(BOUNDED_WAIT, self.accept_share_inner(share_id)).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::Timeout(BOUNDED_WAIT)),
        }
    }

    async fn accept_share_inner(&mut self, share_id: &str) -> Result<CanonicalEvent> {
        let user = self.context.user_id.clone();
        let share = self.live_share(share_id).await?;
        authorize(&share, &user, ShareAction::Accept)?;

        let fork = fork_snapshot(&share, &Uuid::new_v4().to_string());
        self.store
            .insert_event(EventRecord::from_event(&fork))
            .await
            .map_err(SyncError::Store)?;

        let marker = SharedEvent {
            status: ShareStatus::Accepted,
            original_event_id: None,
            updated_at: Some(Utc::now()),
            ..share.clone()
        };
        self.store
            .update_share(SharedEventRecord::from_share(&marker))
            .await
            .map_err(SyncError::Store)?;

        self.notifier
            .share_notice(ShareNotice {
                recipient_id: share.shared_by.clone(),
                sender_id: user,
                event_title: share.snapshot.title.clone(),
                event_id: fork.id.clone(),
                kind: ShareNoticeKind::Accepted,
            })
            .await;

        // The snapshot may already materialize in the grid if this client
        // raced a refresh; replace it with the fork either way.
        self.index.remove_base(&share.snapshot.id);
        self.apply_local_upsert(fork.clone());
        self.hand_off_reminders(&fork).await;
        Ok(fork)
    }

    /// Decline a pending share addressed to the current user. The row stays
    /// behind as a declined tombstone for the sender's history. Bounded by
    /// [`BOUNDED_WAIT`].
    pub async fn decline_share(&mut self, share_id: &str) -> Result<()> {
        match tokio::time::timeout(BOUNDED_WAIT, self.decline_share_inner(share_id)).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::Timeout(BOUNDED_WAIT)),
        }
    }

    async fn decline_share_inner(&mut self, share_id: &str) -> Result<()> {
        let user = self.context.user_id.clone();
        let share = self.live_share(share_id).await?;
        authorize(&share, &user, ShareAction::Decline)?;

        let declined = SharedEvent {
            status: ShareStatus::Declined,
            updated_at: Some(Utc::now()),
            ..share.clone()
        };
        self.store
            .update_share(SharedEventRecord::from_share(&declined))
            .await
            .map_err(SyncError::Store)?;

        self.notifier
            .share_notice(ShareNotice {
                recipient_id: share.shared_by.clone(),
                sender_id: user,
                event_title: share.snapshot.title.clone(),
                event_id: share.snapshot.id.clone(),
                kind: ShareNoticeKind::Declined,
            })
            .await;
        Ok(())
    }

    /// Withdraw a pending share the current user sent. The row is deleted
    /// outright; a row already gone counts as success.
    pub async fn cancel_share(&mut self, share_id: &str) -> Result<()> {
        let user = self.context.user_id.clone();
        let share = match self.store.share_by_id(share_id).await {
            Ok(record) => record.into_share(),
            Err(StoreError::NotFound) => return Ok(()),
            Err(err) => return Err(SyncError::Load(err)),
        };
        authorize(&share, &user, ShareAction::Cancel)?;

        match self.store.delete_share(share_id).await {
            Ok(()) | Err(StoreError::NotFound) => {}
            Err(err) => return Err(SyncError::Store(err)),
        }

        self.notifier
            .share_notice(ShareNotice {
                recipient_id: share.shared_with.clone(),
                sender_id: user.clone(),
                event_title: share.snapshot.title.clone(),
                event_id: share.snapshot.id.clone(),
                kind: ShareNoticeKind::Cancelled,
            })
            .await;

        // Drop the sent-pending badge only once no other pending share for
        // the event remains.
        match self.store.shares_sent(&user, ShareStatus::Pending).await {
            Ok(records) => {
                let still_pending = records.iter().any(|record| {
                    record.original_event_id.as_deref() == Some(share.snapshot.id.as_str())
                });
                if !still_pending {
                    if let Some(event) = self
                        .own_events
                        .iter()
                        .find(|held| held.id == share.snapshot.id)
                        .cloned()
                    {
                        self.apply_local_upsert(event);
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "pending re-check failed; badge clears on next refresh");
            }
        }
        Ok(())
    }

    /// Remove a previously accepted share from the current user's calendar.
    ///
    /// A decline-after-the-fact: the share row flips to declined for the
    /// sender's history, and only the recipient's occurrences disappear. For
    /// an accepted share that was forked, pass the fork's event id so the
    /// copy is deleted too.
    pub async fn retract_accepted(
        &mut self,
        share_id: &str,
        fork_event_id: Option<&str>,
    ) -> Result<()> {
        let user = self.context.user_id.clone();
        match self.store.share_by_id(share_id).await {
            Ok(record) => {
                let share = record.into_share();
                authorize(&share, &user, ShareAction::Retract)?;
                let declined = SharedEvent {
                    status: ShareStatus::Declined,
                    updated_at: Some(Utc::now()),
                    ..share
                };
                self.store
                    .update_share(SharedEventRecord::from_share(&declined))
                    .await
                    .map_err(SyncError::Store)?;
                self.index.remove_base(&declined.snapshot.id);
            }
            Err(StoreError::NotFound) => {}
            Err(err) => return Err(SyncError::Load(err)),
        }

        if let Some(fork_id) = fork_event_id {
            self.delete_event(fork_id).await?;
        }
        Ok(())
    }

    /// Pending shares addressed to the current user, newest first. These
    /// never enter the date index; they surface only through this list.
    pub async fn pending_invitations(&self) -> Result<Vec<PendingInvite>> {
        let records = self
            .store
            .shares_received(&self.context.user_id, ShareStatus::Pending)
            .await
            .map_err(SyncError::Load)?;
        let snapshots = self.enrich(records).await;

        let mut invites: Vec<PendingInvite> = snapshots
            .into_iter()
            .map(|snapshot| PendingInvite {
                share_id: snapshot.share.id.clone(),
                shared_by: snapshot.share.shared_by.clone(),
                shared_by_display_name: snapshot.shared_by_display_name,
                shared_by_avatar: snapshot.shared_by_avatar,
                received_at: snapshot.share.created_at,
                event: snapshot.share.snapshot,
            })
            .collect();
        invites.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        Ok(invites)
    }

    // -- reminders and change notifications ---------------------------------

    /// Re-hand-off reminders for every owned event, e.g. after a refresh.
    pub async fn sync_reminders(&self) {
        for event in &self.own_events {
            self.hand_off_reminders(event).await;
        }
    }

    /// React to a store change notification. Insert/update trigger a
    /// debounced refetch; deletes are ignored by design.
    pub async fn on_store_change(
        &mut self,
        change: &StoreChange,
        now: Instant,
    ) -> Result<ChangeOutcome> {
        if !should_refetch(change) {
            return Ok(ChangeOutcome::Ignored);
        }
        if !self.context.debounce.mark(now) {
            return Ok(ChangeOutcome::Coalesced);
        }
        self.refresh().await?;
        Ok(ChangeOutcome::Refetched)
    }

    // -- internals ----------------------------------------------------------

    fn owns_locally(&self, event_id: &str) -> bool {
        self.own_events.iter().any(|event| event.id == event_id)
    }

    /// Look up an owned event, falling back to the store when the local
    /// cache has not been populated yet.
    async fn owned_event(&self, event_id: &str) -> Result<CanonicalEvent> {
        if let Some(event) = self
            .own_events
            .iter()
            .find(|held| held.id == event_id)
            .cloned()
        {
            return Ok(event);
        }
        let records = self
            .store
            .events_for(&self.context.user_id)
            .await
            .map_err(SyncError::Load)?;
        records
            .into_iter()
            .map(EventRecord::into_event)
            .find(|held| held.id == event_id)
            .ok_or(SyncError::NotOwner)
    }

    async fn live_share(&self, share_id: &str) -> Result<SharedEvent> {
        match self.store.share_by_id(share_id).await {
            Ok(record) => Ok(record.into_share()),
            Err(StoreError::NotFound) => Err(SyncError::ShareUnavailable),
            Err(err) => Err(SyncError::Load(err)),
        }
    }

    /// Replace an event's occurrences and cache entry in one step.
    fn apply_local_upsert(&mut self, event: CanonicalEvent) {
        self.index.remove_base(&event.id);
        self.index.extend(materialize(&event));
        self.own_events.retain(|held| held.id != event.id);
        self.own_events.push(event);
    }

    async fn purge_local(&mut self, event_id: &str) {
        self.index.remove_base(event_id);
        self.own_events.retain(|held| held.id != event_id);
        self.notifier.cancel_reminders(event_id).await;
    }

    async fn hand_off_reminders(&self, event: &CanonicalEvent) {
        self.notifier.cancel_reminders(&event.id).await;
        for occurrence in materialize(event) {
            if let Some(fire_at) = occurrence.reminder_at {
                self.notifier
                    .schedule_reminder(&event.id, &occurrence.title, fire_at)
                    .await;
            }
        }
    }
}
