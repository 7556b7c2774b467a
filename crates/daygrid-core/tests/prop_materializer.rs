//! Property-based checks: materialization bounds, id symmetry, and index
//! removal, over arbitrary event shapes.

use chrono::{Days, NaiveDate};
use daygrid_core::datetime::strip_date_suffix;
use daygrid_core::{materialize, CanonicalEvent, DateIndex, RepeatOption, RECURRENCE_CAP};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Day capped at 28 to avoid invalid month/day combos.
fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2020i32..=2030, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn arb_repeat() -> impl Strategy<Value = RepeatOption> {
    prop_oneof![
        Just(RepeatOption::Daily),
        Just(RepeatOption::Weekly),
        Just(RepeatOption::Monthly),
        Just(RepeatOption::Yearly),
    ]
}

fn timed(id: &str, date: NaiveDate, hour: u32) -> CanonicalEvent {
    let mut event = CanonicalEvent::new(id, "u1", "Event", date);
    event.start_at = Some(date.and_hms_opt(hour, 0, 0).unwrap().and_utc());
    event.end_at = Some(date.and_hms_opt(hour, 30, 0).unwrap().and_utc());
    event
}

/// Any of the four expansion shapes, with the given id.
fn arb_event(id: &'static str) -> impl Strategy<Value = CanonicalEvent> {
    let single = (arb_date(), 0u32..=22).prop_map(move |(date, hour)| timed(id, date, hour));

    let span = (arb_date(), 1u64..=40, 0u32..=22).prop_map(move |(date, days, hour)| {
        let mut event = timed(id, date, hour);
        let last = date.checked_add_days(Days::new(days)).unwrap();
        event.end_at = Some(last.and_hms_opt(hour, 30, 0).unwrap().and_utc());
        event
    });

    let custom = (
        arb_date(),
        proptest::collection::btree_set(arb_date(), 1..8),
    )
        .prop_map(move |(date, dates)| {
            let mut event = timed(id, date, 9);
            event.repeat = RepeatOption::Custom;
            event.custom_dates = dates.into_iter().collect();
            event
        });

    let repeating = (arb_date(), arb_repeat(), proptest::option::of(0u64..=400)).prop_map(
        move |(date, repeat, end_offset)| {
            let mut event = timed(id, date, 9);
            event.repeat = repeat;
            event.repeat_end =
                end_offset.map(|days| date.checked_add_days(Days::new(days)).unwrap());
            event
        },
    );

    prop_oneof![single, span, custom, repeating]
}

// ---------------------------------------------------------------------------
// Materializer invariants
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn plain_single_event_materializes_exactly_once(date in arb_date(), hour in 0u32..=22) {
        let event = timed("e1", date, hour);
        let occurrences = materialize(&event);
        prop_assert_eq!(occurrences.len(), 1);
        prop_assert_eq!(occurrences[0].date_key, date);
        prop_assert_eq!(occurrences[0].occurrence_id.as_str(), "e1");
    }

    #[test]
    fn recurrence_never_exceeds_the_cap(
        date in arb_date(),
        repeat in arb_repeat(),
        end_offset in proptest::option::of(0u64..=2000),
    ) {
        let mut event = timed("e1", date, 9);
        event.repeat = repeat;
        event.repeat_end = end_offset.map(|days| date.checked_add_days(Days::new(days)).unwrap());

        let occurrences = materialize(&event);
        prop_assert!(!occurrences.is_empty());
        prop_assert!(occurrences.len() <= RECURRENCE_CAP);
        prop_assert_eq!(occurrences[0].date_key, date);
    }

    #[test]
    fn recurrence_stays_inside_the_repeat_window(
        date in arb_date(),
        repeat in arb_repeat(),
        window in 0u64..=400,
    ) {
        let until = date.checked_add_days(Days::new(window)).unwrap();
        let mut event = timed("e1", date, 9);
        event.repeat = repeat;
        event.repeat_end = Some(until);

        for occurrence in materialize(&event) {
            prop_assert!(occurrence.date_key >= date);
            prop_assert!(occurrence.date_key <= until);
        }
    }

    #[test]
    fn every_occurrence_recovers_its_base_id(event in arb_event("base_7")) {
        for occurrence in materialize(&event) {
            prop_assert_eq!(occurrence.base_id.as_str(), "base_7");
            prop_assert_eq!(strip_date_suffix(&occurrence.occurrence_id), "base_7");
        }
    }

    #[test]
    fn multi_day_span_covers_every_day_exactly_once(
        date in arb_date(),
        days in 1u64..=40,
        hour in 0u32..=22,
    ) {
        let mut event = timed("e1", date, hour);
        let last = date.checked_add_days(Days::new(days)).unwrap();
        event.end_at = Some(last.and_hms_opt(hour, 30, 0).unwrap().and_utc());

        let occurrences = materialize(&event);
        prop_assert_eq!(occurrences.len() as u64, days + 1);
        for (step, occurrence) in occurrences.iter().enumerate() {
            let expected = date.checked_add_days(Days::new(step as u64)).unwrap();
            prop_assert_eq!(occurrence.date_key, expected);
            prop_assert_eq!(occurrence.start.time(), event.start_at.unwrap().time());
        }
    }

    #[test]
    fn materialized_output_is_sorted_by_date(event in arb_event("e1")) {
        let occurrences = materialize(&event);
        for pair in occurrences.windows(2) {
            prop_assert!(pair[0].date_key <= pair[1].date_key);
        }
    }
}

// ---------------------------------------------------------------------------
// Index removal
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn remove_base_removes_exactly_one_events_occurrences(
        first in arb_event("first"),
        second in arb_event("second"),
    ) {
        let mut index = DateIndex::new();
        index.extend(materialize(&first));
        index.extend(materialize(&second));
        let second_count = materialize(&second).len();

        let removed = index.remove_base("first");
        prop_assert_eq!(removed, materialize(&first).len());
        prop_assert!(!index.contains_base("first"));
        prop_assert!(index.contains_base("second"));
        prop_assert_eq!(index.occurrence_count(), second_count);
    }
}
