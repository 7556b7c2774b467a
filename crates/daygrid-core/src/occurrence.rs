//! Derived, date-anchored occurrences: what a calendar cell actually renders.
//!
//! Occurrences are never persisted. Each one carries its base event id and its
//! date key as explicit fields; the composed string id (`base` or
//! `base_YYYY-MM-DD`) is derived for display and interop, never parsed back to
//! drive engine logic.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::datetime::{date_key, strip_date_suffix};
use crate::event::{CanonicalEvent, EventCategory};
use crate::share::ShareStatus;

/// Which side of a share the viewer is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareDirection {
    /// The viewer sent this share.
    Sent,
    /// The viewer received this share.
    Received,
}

/// Sharing annotation attached to an occurrence that came from (or is covered
/// by) a shared-event row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareAnnotation {
    pub status: ShareStatus,
    pub direction: ShareDirection,
    pub shared_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_by_display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_by_avatar: Option<String>,
}

/// One calendar-cell-worthy instance of a canonical event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    /// Composed display id: the base id, suffixed with `_YYYY-MM-DD` for each
    /// day of a multi-day span.
    pub occurrence_id: String,
    /// The canonical event this occurrence derives from.
    pub base_id: String,
    /// The calendar date this occurrence renders on.
    pub date_key: NaiveDate,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_all_day: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<EventCategory>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharing: Option<ShareAnnotation>,
}

impl Occurrence {
    /// Build one occurrence of `event` on `date`. `spans_days` selects the
    /// composed id form used by multi-day expansion.
    pub(crate) fn derived(
        event: &CanonicalEvent,
        date: NaiveDate,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        reminder_at: Option<DateTime<Utc>>,
        spans_days: bool,
    ) -> Self {
        let occurrence_id = if spans_days {
            format!("{}_{}", event.id, date_key(date))
        } else {
            event.id.clone()
        };
        Occurrence {
            occurrence_id,
            base_id: event.id.clone(),
            date_key: date,
            title: event.title.clone(),
            start,
            end,
            is_all_day: event.display_all_day(),
            category: event.category.clone(),
            photos: event.all_photos(),
            reminder_at,
            sharing: None,
        }
    }

    pub fn with_sharing(mut self, annotation: ShareAnnotation) -> Self {
        self.sharing = Some(annotation);
        self
    }

    /// Whether any sharing annotation marks this as a pending sent share.
    pub fn is_sent_pending(&self) -> bool {
        matches!(
            &self.sharing,
            Some(a) if a.direction == ShareDirection::Sent && a.status == ShareStatus::Pending
        )
    }
}

/// Recover the base event id from a composed occurrence id string.
///
/// The explicit [`Occurrence::base_id`] field is authoritative; this exists
/// for callers holding only the string form.
pub fn base_id_of(occurrence_id: &str) -> &str {
    strip_date_suffix(occurrence_id)
}

/// Order one day's occurrences for display: all-day entries first, then by
/// start time, then by base id for a stable tiebreak. Bucket order inside the
/// date index itself is unspecified; presentation surfaces sort at render time.
pub fn display_order(day: &mut [Occurrence]) {
    day.sort_by(|a, b| {
        b.is_all_day
            .cmp(&a.is_all_day)
            .then(a.start.cmp(&b.start))
            .then_with(|| a.base_id.cmp(&b.base_id))
    });
}
