//! The canonical event record: the owned source of truth for one logical event.
//!
//! A canonical event takes exactly one of three shapes: single-day, multi-day
//! (start and end fall on different calendar dates), or custom (an explicit
//! date list, each date optionally carrying its own time window). Stepped
//! recurrence (daily/weekly/monthly/yearly) is a rendering concept layered on
//! a single-day event, never stored per date.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::datetime::{all_day_end, all_day_start};

/// How an event repeats across the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatOption {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// The event owns an explicit list of dates instead of a stepping rule.
    Custom,
}

impl RepeatOption {
    /// Parse the stored token leniently; anything unrecognized means "does not repeat".
    pub fn from_wire(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "daily" => RepeatOption::Daily,
            "weekly" => RepeatOption::Weekly,
            "monthly" => RepeatOption::Monthly,
            "yearly" => RepeatOption::Yearly,
            "custom" => RepeatOption::Custom,
            _ => RepeatOption::None,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            RepeatOption::None => "none",
            RepeatOption::Daily => "daily",
            RepeatOption::Weekly => "weekly",
            RepeatOption::Monthly => "monthly",
            RepeatOption::Yearly => "yearly",
            RepeatOption::Custom => "custom",
        }
    }

    /// True for the fixed-step rules the materializer expands by date arithmetic.
    pub fn is_stepped(&self) -> bool {
        matches!(
            self,
            RepeatOption::Daily | RepeatOption::Weekly | RepeatOption::Monthly | RepeatOption::Yearly
        )
    }
}

/// Display category attached to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCategory {
    pub name: String,
    pub color: String,
}

/// Per-date override for a custom event: an independent time window for one of
/// its dates. `repeat` is carried for store write-back only; custom dates are
/// never additionally stepped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomTime {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub repeat: RepeatOption,
}

/// The source-of-truth record for a single logical event, owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    /// Opaque id, stable for the event's lifetime.
    pub id: String,
    /// Owning user id.
    pub owner: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Anchor local date.
    pub date: NaiveDate,
    /// Start instant. `None` means the stored timestamp was absent or
    /// unparseable; the event still materializes, displayed as all-day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<EventCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub repeat: RepeatOption,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_end: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_dates: Vec<NaiveDate>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_times: BTreeMap<NaiveDate, CustomTime>,
    /// Publicly visible photo URLs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<String>,
    /// Owner-only photo URLs; merged with `photos` for display, tracked
    /// separately for write-back.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub private_photos: Vec<String>,
}

impl CanonicalEvent {
    /// A minimal single-day event; callers fill in the rest field by field.
    pub fn new(
        id: impl Into<String>,
        owner: impl Into<String>,
        title: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        CanonicalEvent {
            id: id.into(),
            owner: owner.into(),
            title: title.into(),
            description: None,
            location: None,
            date,
            start_at: None,
            end_at: None,
            is_all_day: false,
            category: None,
            reminder_at: None,
            repeat: RepeatOption::None,
            repeat_end: None,
            custom_dates: Vec::new(),
            custom_times: BTreeMap::new(),
            photos: Vec::new(),
            private_photos: Vec::new(),
        }
    }

    /// Whether the event renders as all-day: either flagged so, or timeless
    /// because its stored timestamps were absent or unparseable.
    pub fn display_all_day(&self) -> bool {
        self.is_all_day || self.start_at.is_none()
    }

    /// Effective start instant. All-day events anchor to the fixed 12:00 UTC
    /// hour on their start date; timeless events anchor on the anchor date.
    pub fn effective_start(&self) -> DateTime<Utc> {
        match self.start_at {
            Some(start) if self.is_all_day => all_day_start(start.date_naive()),
            Some(start) => start,
            None => all_day_start(self.date),
        }
    }

    /// Effective end instant. A missing end defaults to one hour after the
    /// start; all-day events anchor to 13:00 UTC on their end date.
    pub fn effective_end(&self) -> DateTime<Utc> {
        match (self.start_at, self.end_at) {
            (_, Some(end)) if self.is_all_day => all_day_end(end.date_naive()),
            (_, Some(end)) => end,
            (Some(start), None) if !self.is_all_day => start + Duration::hours(1),
            (Some(start), None) => all_day_end(start.date_naive()),
            (None, None) => all_day_end(self.date),
        }
    }

    /// Whether the effective start and end fall on different calendar dates.
    pub fn is_multi_day(&self) -> bool {
        self.effective_start().date_naive() != self.effective_end().date_naive()
    }

    /// How far before the start the reminder fires, if one is set.
    pub fn reminder_offset(&self) -> Option<Duration> {
        self.reminder_at.map(|at| self.effective_start() - at)
    }

    /// Public and private photos merged for display, public first.
    pub fn all_photos(&self) -> Vec<String> {
        let mut merged = self.photos.clone();
        merged.extend(self.private_photos.iter().cloned());
        merged
    }
}
