//! Date and instant helpers shared by the materializer and the wire records.
//!
//! All instants are `DateTime<Utc>`; calendar positions are `NaiveDate`. All-day
//! events are anchored to fixed mid-day hours (12:00 and 13:00 UTC) so that a
//! UTC-only store round-trips them without shifting the calendar day.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Hour (UTC) an all-day event starts at when persisted as an instant.
pub const ALL_DAY_START_HOUR: u32 = 12;

/// Hour (UTC) an all-day event ends at when persisted as an instant.
pub const ALL_DAY_END_HOUR: u32 = 13;

/// The fixed start instant for an all-day occurrence on `date`.
pub fn all_day_start(date: NaiveDate) -> DateTime<Utc> {
    at_hour(date, ALL_DAY_START_HOUR)
}

/// The fixed end instant for an all-day occurrence on `date`.
pub fn all_day_end(date: NaiveDate) -> DateTime<Utc> {
    at_hour(date, ALL_DAY_END_HOUR)
}

fn at_hour(date: NaiveDate, hour: u32) -> DateTime<Utc> {
    let naive = date
        .and_hms_opt(hour, 0, 0)
        .expect("whole hours 0..=23 are valid wall-clock times");
    Utc.from_utc_datetime(&naive)
}

/// Format a calendar date as a `YYYY-MM-DD` date key.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` date key. Returns `None` on anything else.
pub fn parse_date_key(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Parse a persisted timestamp into a UTC instant.
///
/// Accepts RFC 3339 (`2025-01-15T09:00:00Z`, offsets allowed) and naive
/// datetimes (`2025-01-15T09:00:00`), which are interpreted as UTC. Returns
/// `None` on anything unparseable; callers fall back to all-day display
/// rather than dropping the event.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|ndt| ndt.and_utc())
}

/// Format an instant in the wire form the store expects: `YYYY-MM-DDTHH:MM:SSZ`.
pub fn wire_instant(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Recover a base event id from a composed occurrence id.
///
/// Multi-day occurrences compose their id as `<base>_<YYYY-MM-DD>`; every other
/// occurrence id *is* the base id. Prefer [`crate::occurrence::Occurrence::base_id`],
/// which carries the base explicitly; this string recovery exists for interop
/// with callers that persisted composed ids, and it misfires on base ids that
/// themselves end in an `_`-joined date-shaped token.
pub fn strip_date_suffix(occurrence_id: &str) -> &str {
    if let Some((base, suffix)) = occurrence_id.rsplit_once('_') {
        if !base.is_empty() && parse_date_key(suffix).is_some() {
            return base;
        }
    }
    occurrence_id
}

/// Default recurrence horizon when no end date is stored: one year past the anchor.
pub fn default_repeat_end(anchor: NaiveDate) -> NaiveDate {
    anchor
        .checked_add_months(Months::new(12))
        .unwrap_or(anchor)
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// Last day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    month_start(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.checked_sub_days(Days::new(1)))
        .unwrap_or(date)
}
