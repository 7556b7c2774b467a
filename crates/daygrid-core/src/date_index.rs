//! The per-date occurrence index and the reconciliation pass that builds it
//! from the three independently-fetched streams: own events, accepted shares,
//! and sent-but-pending shares.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::event::CanonicalEvent;
use crate::materializer::materialize;
use crate::occurrence::{Occurrence, ShareAnnotation, ShareDirection};
use crate::share::{visibility, SharedEvent, ShareVisibility};

/// `date -> occurrences` map backing the calendar grid.
///
/// Bucket order is unspecified; presentation surfaces sort with
/// [`crate::occurrence::display_order`] at render time. The map itself stays
/// ordered by date, so month and agenda views walk it directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateIndex {
    days: BTreeMap<NaiveDate, Vec<Occurrence>>,
}

impl DateIndex {
    pub fn new() -> Self {
        DateIndex::default()
    }

    /// Fold one occurrence into its date bucket.
    ///
    /// Buckets are deduplicated on `(base_id, date_key)`: the first
    /// occurrence in wins, and a later duplicate only contributes its sharing
    /// annotation if the existing entry has none. Callers insert own events
    /// before shared snapshots so that own data takes precedence.
    pub fn insert(&mut self, occurrence: Occurrence) {
        let bucket = self.days.entry(occurrence.date_key).or_default();
        if let Some(existing) = bucket
            .iter_mut()
            .find(|held| held.base_id == occurrence.base_id)
        {
            if existing.sharing.is_none() {
                existing.sharing = occurrence.sharing;
            }
            return;
        }
        bucket.push(occurrence);
    }

    pub fn extend<I: IntoIterator<Item = Occurrence>>(&mut self, occurrences: I) {
        for occurrence in occurrences {
            self.insert(occurrence);
        }
    }

    /// Remove every occurrence derived from `base_id`, across all date
    /// buckets, pruning buckets that end up empty. Returns how many
    /// occurrences were removed.
    ///
    /// A multi-day or custom event leaves occurrences on many dates; every
    /// mutation path must call this before inserting replacements, or edits
    /// strand orphans on the dates no longer covered.
    pub fn remove_base(&mut self, base_id: &str) -> usize {
        let mut removed = 0;
        self.days.retain(|_, bucket| {
            let before = bucket.len();
            bucket.retain(|held| held.base_id != base_id);
            removed += before - bucket.len();
            !bucket.is_empty()
        });
        removed
    }

    /// Occurrences on one date; empty slice when the date has none.
    pub fn day(&self, date: NaiveDate) -> &[Occurrence] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or_default()
    }

    /// Dates in `[start, end]` that carry occurrences, in date order.
    pub fn range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = (NaiveDate, &[Occurrence])> {
        self.days
            .range(start..=end)
            .map(|(date, bucket)| (*date, bucket.as_slice()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &[Occurrence])> {
        self.days
            .iter()
            .map(|(date, bucket)| (*date, bucket.as_slice()))
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn contains_base(&self, base_id: &str) -> bool {
        self.days
            .values()
            .any(|bucket| bucket.iter().any(|held| held.base_id == base_id))
    }

    pub fn occurrence_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// A shared-event row paired with the sender profile fields the grid shows
/// on annotated occurrences. Profile lookups are best-effort; a missing
/// profile leaves the name and avatar unset.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedSnapshot {
    pub share: SharedEvent,
    pub shared_by_display_name: Option<String>,
    pub shared_by_avatar: Option<String>,
}

impl SharedSnapshot {
    pub fn new(share: SharedEvent) -> Self {
        SharedSnapshot {
            share,
            shared_by_display_name: None,
            shared_by_avatar: None,
        }
    }

    fn annotation(&self, direction: ShareDirection) -> ShareAnnotation {
        ShareAnnotation {
            status: self.share.status,
            direction,
            shared_by: self.share.shared_by.clone(),
            shared_by_display_name: self.shared_by_display_name.clone(),
            shared_by_avatar: self.shared_by_avatar.clone(),
        }
    }
}

/// Reconcile the three occurrence streams into one index for `viewer`.
///
/// Own events materialize plain. Accepted shares materialize from their
/// frozen snapshot only for the recipient and only while un-forked; accepted
/// markers contribute nothing. Sent-pending shares materialize for the
/// sender, where deduplication folds the annotation onto the sender's own
/// occurrence of the same event. The recipient side of a pending share is
/// deliberately absent; pending invitations surface through a separate list,
/// never the grid.
///
/// The streams come from separate queries and may disagree mid-transition;
/// rows whose status no longer matches their stream are skipped and the next
/// refresh converges.
pub fn build_index(
    own: &[CanonicalEvent],
    accepted: &[SharedSnapshot],
    sent_pending: &[SharedSnapshot],
    viewer: &str,
) -> DateIndex {
    let mut index = DateIndex::new();
    for event in own {
        index.extend(materialize(event));
    }
    for snapshot in accepted {
        if visibility(&snapshot.share, viewer) != ShareVisibility::ReceivedAccepted {
            continue;
        }
        let annotation = snapshot.annotation(ShareDirection::Received);
        index.extend(
            materialize(&snapshot.share.snapshot)
                .into_iter()
                .map(|occurrence| occurrence.with_sharing(annotation.clone())),
        );
    }
    for snapshot in sent_pending {
        if visibility(&snapshot.share, viewer) != ShareVisibility::SentPending {
            continue;
        }
        let annotation = snapshot.annotation(ShareDirection::Sent);
        index.extend(
            materialize(&snapshot.share.snapshot)
                .into_iter()
                .map(|occurrence| occurrence.with_sharing(annotation.clone())),
        );
    }
    index
}
