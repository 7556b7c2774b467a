//! Wire records for the two store tables, `events` and `shared_events`, and
//! their tolerant conversions to and from the domain types.
//!
//! Rows written by older builds or mangled in transit still decode: every
//! field defaults, timestamps parse leniently, and a record whose instants
//! are unusable becomes a timeless all-day event rather than an error.
//! Writes are strict and always produce the canonical wire spellings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::date_index::{build_index, DateIndex, SharedSnapshot};
use crate::datetime::{
    all_day_end, all_day_start, date_key, parse_date_key, parse_instant, wire_instant,
};
use crate::event::{CanonicalEvent, CustomTime, EventCategory, RepeatOption};
use crate::share::{visibility, SharedEvent, ShareStatus, ShareVisibility};

/// One row of the `events` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default)]
    pub id: String,
    /// Omitted inside `shared_events.event_data` snapshots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_datetime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_datetime: Option<String>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_option: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_dates: Vec<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub custom_times: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub private_photos: Vec<String>,
}

/// Per-date override inside the `custom_times` json column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct CustomTimeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reminder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    repeat: Option<String>,
}

impl EventRecord {
    pub fn from_event(event: &CanonicalEvent) -> Self {
        EventRecord {
            id: event.id.clone(),
            user_id: Some(event.owner.clone()),
            title: event.title.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            date: date_key(event.date),
            // All-day instants persist at the fixed 12:00/13:00 UTC anchors
            // so the calendar day survives a UTC-only store.
            start_datetime: event.start_at.map(|at| {
                wire_instant(if event.is_all_day {
                    all_day_start(at.date_naive())
                } else {
                    at
                })
            }),
            end_datetime: event.end_at.map(|at| {
                wire_instant(if event.is_all_day {
                    all_day_end(at.date_naive())
                } else {
                    at
                })
            }),
            is_all_day: event.is_all_day,
            category_name: event.category.as_ref().map(|c| c.name.clone()),
            category_color: event.category.as_ref().map(|c| c.color.clone()),
            reminder_time: event.reminder_at.map(wire_instant),
            repeat_option: (event.repeat != RepeatOption::None)
                .then(|| event.repeat.as_wire().to_owned()),
            repeat_end_date: event.repeat_end.map(date_key),
            custom_dates: event.custom_dates.iter().copied().map(date_key).collect(),
            custom_times: wire_custom_times(&event.custom_times),
            photos: event.photos.clone(),
            private_photos: event.private_photos.clone(),
        }
    }

    /// Decode into the domain type. Total: unusable fields default instead
    /// of failing, and a record with no parseable instants still yields a
    /// timeless all-day event on its anchor date.
    pub fn into_event(self) -> CanonicalEvent {
        let start_at = self.start_datetime.as_deref().and_then(parse_instant);
        let date = parse_date_key(&self.date)
            .or_else(|| start_at.map(|at| at.date_naive()))
            .unwrap_or_default();
        let category = self.category_name.map(|name| EventCategory {
            name,
            color: self.category_color.unwrap_or_default(),
        });
        CanonicalEvent {
            id: self.id,
            owner: self.user_id.unwrap_or_default(),
            title: self.title,
            description: self.description,
            location: self.location,
            date,
            start_at,
            end_at: self.end_datetime.as_deref().and_then(parse_instant),
            is_all_day: self.is_all_day,
            category,
            reminder_at: self.reminder_time.as_deref().and_then(parse_instant),
            repeat: self
                .repeat_option
                .as_deref()
                .map(RepeatOption::from_wire)
                .unwrap_or_default(),
            repeat_end: self.repeat_end_date.as_deref().and_then(parse_date_key),
            custom_dates: self
                .custom_dates
                .iter()
                .filter_map(|key| parse_date_key(key))
                .collect(),
            custom_times: parse_custom_times(&self.custom_times),
            photos: self.photos,
            private_photos: self.private_photos,
        }
    }
}

fn wire_custom_times(times: &BTreeMap<NaiveDate, CustomTime>) -> Value {
    if times.is_empty() {
        return Value::Null;
    }
    let entries = times
        .iter()
        .map(|(date, entry)| {
            let record = CustomTimeRecord {
                start: Some(wire_instant(entry.start)),
                end: Some(wire_instant(entry.end)),
                reminder: entry.reminder_at.map(wire_instant),
                repeat: (entry.repeat != RepeatOption::None)
                    .then(|| entry.repeat.as_wire().to_owned()),
            };
            let value = serde_json::to_value(record).unwrap_or_default();
            (date_key(*date), value)
        })
        .collect();
    Value::Object(entries)
}

/// Walk the `custom_times` json column, keeping every entry with a parseable
/// date key and start instant and skipping the rest. A missing end defaults
/// to one hour after the start.
fn parse_custom_times(value: &Value) -> BTreeMap<NaiveDate, CustomTime> {
    let mut parsed = BTreeMap::new();
    let Some(entries) = value.as_object() else {
        return parsed;
    };
    for (key, raw) in entries {
        let Some(date) = parse_date_key(key) else {
            continue;
        };
        let Ok(record) = serde_json::from_value::<CustomTimeRecord>(raw.clone()) else {
            continue;
        };
        let Some(start) = record.start.as_deref().and_then(parse_instant) else {
            continue;
        };
        let end = record
            .end
            .as_deref()
            .and_then(parse_instant)
            .unwrap_or(start + chrono::Duration::hours(1));
        parsed.insert(
            date,
            CustomTime {
                start,
                end,
                reminder_at: record.reminder.as_deref().and_then(parse_instant),
                repeat: record
                    .repeat
                    .as_deref()
                    .map(RepeatOption::from_wire)
                    .unwrap_or_default(),
            },
        );
    }
    parsed
}

/// One row of the `shared_events` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedEventRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_event_id: Option<String>,
    #[serde(default)]
    pub shared_by: String,
    #[serde(default)]
    pub shared_with: String,
    #[serde(default)]
    pub status: String,
    /// Snapshot of the event at share time, same shape as an `events` row
    /// minus `user_id`.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub event_data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl SharedEventRecord {
    pub fn from_share(share: &SharedEvent) -> Self {
        let mut record = EventRecord::from_event(&share.snapshot);
        record.user_id = None;
        SharedEventRecord {
            id: share.id.clone(),
            original_event_id: share.original_event_id.clone(),
            shared_by: share.shared_by.clone(),
            shared_with: share.shared_with.clone(),
            status: share.status.as_wire().to_owned(),
            event_data: serde_json::to_value(record).unwrap_or_default(),
            created_at: share.created_at.map(wire_instant),
            updated_at: share.updated_at.map(wire_instant),
        }
    }

    /// Decode into the domain type. An unreadable `event_data` snapshot
    /// degrades to an empty event; the sender is restored as the snapshot's
    /// owner since snapshots travel without `user_id`.
    pub fn into_share(self) -> SharedEvent {
        let record: EventRecord =
            serde_json::from_value(self.event_data).unwrap_or_default();
        let mut snapshot = record.into_event();
        if snapshot.id.is_empty() {
            snapshot.id = self.original_event_id.clone().unwrap_or_default();
        }
        if snapshot.owner.is_empty() {
            snapshot.owner = self.shared_by.clone();
        }
        SharedEvent {
            id: self.id,
            original_event_id: self.original_event_id,
            shared_by: self.shared_by,
            shared_with: self.shared_with,
            status: ShareStatus::from_wire(&self.status),
            snapshot,
            created_at: self.created_at.as_deref().and_then(parse_instant),
            updated_at: self.updated_at.as_deref().and_then(parse_instant),
        }
    }
}

/// Build a date index straight from wire rows.
///
/// Event rows owned by another user are dropped: a document may carry the
/// sender's canonical row alongside a still-pending share, and folding it in
/// would show the recipient an event they have not accepted. Rows without a
/// `user_id`, and all rows when no viewer is given, index as the viewer's
/// own. Shared rows are routed by [`visibility`]: accepted rows the viewer
/// received and pending rows the viewer sent reach the index, everything
/// else is dropped. This is the whole pipeline for embedders that hold raw
/// rows rather than pre-partitioned streams.
pub fn index_from_records(
    events: Vec<EventRecord>,
    shares: Vec<SharedEventRecord>,
    viewer: &str,
) -> DateIndex {
    let own: Vec<CanonicalEvent> = events
        .into_iter()
        .filter(|record| {
            viewer.is_empty()
                || record
                    .user_id
                    .as_deref()
                    .map_or(true, |owner| owner == viewer)
        })
        .map(EventRecord::into_event)
        .collect();

    let mut accepted = Vec::new();
    let mut sent_pending = Vec::new();
    for row in shares {
        let share = row.into_share();
        match visibility(&share, viewer) {
            ShareVisibility::ReceivedAccepted => accepted.push(SharedSnapshot::new(share)),
            ShareVisibility::SentPending => sent_pending.push(SharedSnapshot::new(share)),
            ShareVisibility::Hidden => {}
        }
    }

    build_index(&own, &accepted, &sent_pending, viewer)
}
