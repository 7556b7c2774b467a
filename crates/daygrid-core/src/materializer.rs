//! Expansion of one canonical event into its dated occurrence set.
//!
//! Pure and total: no I/O, and malformed inputs degrade to a defaulted
//! occurrence rather than an error. Exactly one expansion rule applies per
//! event, checked in priority order: multi-day span, then custom dates, then
//! stepped recurrence, then a single default occurrence.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::datetime::{all_day_end, all_day_start, default_repeat_end};
use crate::event::{CanonicalEvent, RepeatOption};
use crate::occurrence::Occurrence;

/// Hard bound on instances produced for one recurring event, enforced even
/// when `repeat_end` is wrong or missing.
pub const RECURRENCE_CAP: usize = 100;

/// Expand `event` into its complete occurrence list, ordered by date then
/// start instant.
pub fn materialize(event: &CanonicalEvent) -> Vec<Occurrence> {
    let mut occurrences = if event.is_multi_day() {
        expand_span(event)
    } else if !event.custom_dates.is_empty() {
        expand_custom(event)
    } else if event.repeat.is_stepped() {
        expand_repeating(event)
    } else {
        vec![single(event)]
    };
    occurrences.sort_by(|a, b| a.date_key.cmp(&b.date_key).then(a.start.cmp(&b.start)));
    occurrences
}

/// One occurrence per calendar day of the span, inclusive on both ends.
///
/// Every day keeps the original time-of-day (or the fixed all-day hours), so
/// a 09:00 start displays as 09:00 on each day of the span. Only this rule
/// composes date-suffixed occurrence ids.
fn expand_span(event: &CanonicalEvent) -> Vec<Occurrence> {
    let start = event.effective_start();
    let end = event.effective_end();
    let all_day = event.display_all_day();
    let start_tod = start.time();
    let end_tod = end.time();

    let mut occurrences = Vec::new();
    let mut day = start.date_naive();
    let last = end.date_naive();
    while day <= last {
        let (day_start, day_end) = if all_day {
            (all_day_start(day), all_day_end(day))
        } else {
            (
                day.and_time(start_tod).and_utc(),
                day.and_time(end_tod).and_utc(),
            )
        };
        occurrences.push(Occurrence::derived(
            event,
            day,
            day_start,
            day_end,
            event.reminder_at,
            true,
        ));
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    // An inverted span (end before start) expands to nothing; emit the
    // defaulted single occurrence instead of dropping the event.
    if occurrences.is_empty() {
        occurrences.push(single(event));
    }
    occurrences
}

/// One occurrence per custom date, each reusing the bare base id.
///
/// A `custom_times` entry overrides the window for its date; otherwise the
/// event's default window applies, re-anchored to the custom date for
/// all-day events.
fn expand_custom(event: &CanonicalEvent) -> Vec<Occurrence> {
    let all_day = event.display_all_day();
    let default_start = event.effective_start();
    let default_end = event.effective_end();

    let mut occurrences = Vec::with_capacity(event.custom_dates.len());
    for &date in &event.custom_dates {
        let custom = event.custom_times.get(&date);
        let (start, end) = match custom {
            Some(entry) => (entry.start, entry.end),
            None if all_day => (all_day_start(date), all_day_end(date)),
            None => (default_start, default_end),
        };
        let reminder = custom
            .and_then(|entry| entry.reminder_at)
            .or(event.reminder_at);
        occurrences.push(Occurrence::derived(event, date, start, end, reminder, false));
    }
    occurrences
}

/// Dated instances stepped from the anchor until `repeat_end` (anchor plus
/// one year when unset) or [`RECURRENCE_CAP`], whichever comes first.
///
/// The anchor instance is always emitted, even when `repeat_end` precedes
/// it. Instances share the base id; each carries its own date, keeps the
/// anchor's time-of-day and window duration, and shifts the reminder by the
/// anchor's reminder offset.
fn expand_repeating(event: &CanonicalEvent) -> Vec<Occurrence> {
    let base_start = event.effective_start();
    let window = event.effective_end() - base_start;
    let time_of_day = base_start.time();
    let offset = event.reminder_offset();
    let until = event
        .repeat_end
        .unwrap_or_else(|| default_repeat_end(event.date));

    let mut occurrences = Vec::new();
    let mut date = event.date;
    loop {
        if occurrences.len() >= RECURRENCE_CAP {
            break;
        }
        let start = date.and_time(time_of_day).and_utc();
        let reminder = offset.map(|ahead| start - ahead);
        occurrences.push(Occurrence::derived(
            event,
            date,
            start,
            start + window,
            reminder,
            false,
        ));
        date = match next_anchor(date, event.repeat) {
            Some(next) if next <= until => next,
            _ => break,
        };
    }
    occurrences
}

fn single(event: &CanonicalEvent) -> Occurrence {
    Occurrence::derived(
        event,
        event.date,
        event.effective_start(),
        event.effective_end(),
        event.reminder_at,
        false,
    )
}

/// Step one recurrence interval forward. Month and year steps clamp to the
/// last valid day, so an event anchored on Jan 31 recurs on Feb 28.
fn next_anchor(date: NaiveDate, repeat: RepeatOption) -> Option<NaiveDate> {
    match repeat {
        RepeatOption::Daily => date.checked_add_days(Days::new(1)),
        RepeatOption::Weekly => date.checked_add_days(Days::new(7)),
        RepeatOption::Monthly => date.checked_add_months(Months::new(1)),
        RepeatOption::Yearly => date.checked_add_months(Months::new(12)),
        RepeatOption::None | RepeatOption::Custom => None,
    }
}

/// The inclusive day count a multi-day event spans, used by presentation
/// surfaces for "day N of M" labels.
pub fn span_days(event: &CanonicalEvent) -> u32 {
    let start = event.effective_start().date_naive();
    let end = event.effective_end().date_naive();
    if end < start {
        return 1;
    }
    (end.num_days_from_ce() - start.num_days_from_ce() + 1) as u32
}
