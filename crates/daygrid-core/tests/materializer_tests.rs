//! Expansion rules: multi-day spans, custom dates, stepped recurrence, and
//! the single-occurrence default, plus the edge policy for malformed input.

use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use daygrid_core::datetime::strip_date_suffix;
use daygrid_core::event::CustomTime;
use daygrid_core::{materialize, CanonicalEvent, RepeatOption, RECURRENCE_CAP};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn timed_event(start: (i32, u32, u32, u32, u32), end: (i32, u32, u32, u32, u32)) -> CanonicalEvent {
    let (sy, sm, sd, sh, smin) = start;
    let (ey, em, ed, eh, emin) = end;
    let mut event = CanonicalEvent::new("e1", "u1", "Event", day(sy, sm, sd));
    event.start_at = Some(Utc.with_ymd_and_hms(sy, sm, sd, sh, smin, 0).unwrap());
    event.end_at = Some(Utc.with_ymd_and_hms(ey, em, ed, eh, emin, 0).unwrap());
    event
}

// ---------------------------------------------------------------------------
// Default rule: one occurrence on the anchor date
// ---------------------------------------------------------------------------

#[test]
fn single_event_yields_one_occurrence_on_anchor_date() {
    let event = timed_event((2025, 1, 15, 9, 0), (2025, 1, 15, 10, 0));
    let occurrences = materialize(&event);

    assert_eq!(occurrences.len(), 1);
    assert_eq!(occurrences[0].date_key, day(2025, 1, 15));
    assert_eq!(occurrences[0].occurrence_id, "e1");
    assert_eq!(occurrences[0].base_id, "e1");
    assert!(!occurrences[0].is_all_day);
}

#[test]
fn missing_end_defaults_to_one_hour_after_start() {
    let mut event = CanonicalEvent::new("e1", "u1", "Event", day(2025, 1, 15));
    event.start_at = Some(Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap());

    let occurrences = materialize(&event);
    assert_eq!(occurrences.len(), 1);
    assert_eq!(
        occurrences[0].end,
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap()
    );
}

#[test]
fn all_day_event_anchors_to_fixed_utc_hours() {
    let mut event = CanonicalEvent::new("e1", "u1", "Event", day(2025, 1, 15));
    event.is_all_day = true;
    event.start_at = Some(Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap());
    event.end_at = Some(Utc.with_ymd_and_hms(2025, 1, 15, 13, 0, 0).unwrap());

    let occurrences = materialize(&event);
    assert_eq!(occurrences.len(), 1);
    assert!(occurrences[0].is_all_day);
    assert_eq!(
        occurrences[0].start,
        Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
    );
    assert_eq!(
        occurrences[0].end,
        Utc.with_ymd_and_hms(2025, 1, 15, 13, 0, 0).unwrap()
    );
}

#[test]
fn timeless_event_still_materializes_as_all_day() {
    // No timestamps at all, as after a failed parse of a mangled row.
    let event = CanonicalEvent::new("e1", "u1", "Event", day(2025, 1, 15));

    let occurrences = materialize(&event);
    assert_eq!(occurrences.len(), 1);
    assert!(occurrences[0].is_all_day);
    assert_eq!(occurrences[0].date_key, day(2025, 1, 15));
    assert_eq!(
        occurrences[0].start,
        Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
    );
    assert_eq!(
        occurrences[0].end,
        Utc.with_ymd_and_hms(2025, 1, 15, 13, 0, 0).unwrap()
    );
}

// ---------------------------------------------------------------------------
// Multi-day spans
// ---------------------------------------------------------------------------

#[test]
fn multi_day_span_emits_one_occurrence_per_day_with_time_preserved() {
    let event = timed_event((2025, 1, 15, 9, 0), (2025, 1, 17, 9, 0));
    let occurrences = materialize(&event);

    assert_eq!(occurrences.len(), 3);
    for (occurrence, expected_day) in occurrences.iter().zip(15u32..=17) {
        assert_eq!(occurrence.date_key, day(2025, 1, expected_day));
        assert_eq!(
            occurrence.start,
            Utc.with_ymd_and_hms(2025, 1, expected_day, 9, 0, 0).unwrap()
        );
    }
}

#[test]
fn multi_day_ids_carry_date_suffix_and_recover_base() {
    let event = timed_event((2025, 1, 15, 9, 0), (2025, 1, 17, 9, 0));
    let occurrences = materialize(&event);

    let ids: Vec<&str> = occurrences.iter().map(|o| o.occurrence_id.as_str()).collect();
    assert_eq!(ids, vec!["e1_2025-01-15", "e1_2025-01-16", "e1_2025-01-17"]);
    for occurrence in &occurrences {
        assert_eq!(strip_date_suffix(&occurrence.occurrence_id), "e1");
        assert_eq!(occurrence.base_id, "e1");
    }
}

#[test]
fn multi_day_all_day_uses_fixed_hours_on_every_day() {
    let mut event = CanonicalEvent::new("e1", "u1", "Event", day(2025, 3, 1));
    event.is_all_day = true;
    event.start_at = Some(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap());
    event.end_at = Some(Utc.with_ymd_and_hms(2025, 3, 3, 13, 0, 0).unwrap());

    let occurrences = materialize(&event);
    assert_eq!(occurrences.len(), 3);
    for occurrence in &occurrences {
        assert!(occurrence.is_all_day);
        let d = occurrence.date_key.day();
        assert_eq!(occurrence.start, Utc.with_ymd_and_hms(2025, 3, d, 12, 0, 0).unwrap());
        assert_eq!(occurrence.end, Utc.with_ymd_and_hms(2025, 3, d, 13, 0, 0).unwrap());
    }
}

#[test]
fn multi_day_takes_precedence_over_recurrence() {
    let mut event = timed_event((2025, 1, 15, 9, 0), (2025, 1, 16, 9, 0));
    event.repeat = RepeatOption::Daily;

    let occurrences = materialize(&event);
    assert_eq!(occurrences.len(), 2);
}

#[test]
fn multi_day_takes_precedence_over_custom_dates() {
    let mut event = timed_event((2025, 1, 15, 9, 0), (2025, 1, 16, 9, 0));
    event.repeat = RepeatOption::Custom;
    event.custom_dates = vec![day(2025, 2, 1), day(2025, 2, 2)];

    let occurrences = materialize(&event);
    assert_eq!(occurrences.len(), 2);
    assert_eq!(occurrences[0].date_key, day(2025, 1, 15));
    assert_eq!(occurrences[1].date_key, day(2025, 1, 16));
}

#[test]
fn inverted_span_falls_back_to_single_occurrence() {
    // End before start across dates; never drop the event.
    let event = timed_event((2025, 1, 17, 9, 0), (2025, 1, 15, 9, 0));
    let occurrences = materialize(&event);

    assert_eq!(occurrences.len(), 1);
    assert_eq!(occurrences[0].date_key, day(2025, 1, 17));
}

// ---------------------------------------------------------------------------
// Custom dates
// ---------------------------------------------------------------------------

#[test]
fn custom_dates_reuse_the_bare_base_id() {
    let mut event = timed_event((2025, 1, 10, 14, 0), (2025, 1, 10, 15, 0));
    event.repeat = RepeatOption::Custom;
    event.custom_dates = vec![day(2025, 1, 10), day(2025, 1, 20), day(2025, 2, 5)];

    let occurrences = materialize(&event);
    assert_eq!(occurrences.len(), 3);
    for occurrence in &occurrences {
        assert_eq!(occurrence.occurrence_id, "e1");
    }
    let dates: Vec<NaiveDate> = occurrences.iter().map(|o| o.date_key).collect();
    assert_eq!(dates, vec![day(2025, 1, 10), day(2025, 1, 20), day(2025, 2, 5)]);
}

#[test]
fn custom_time_override_replaces_window_and_reminder() {
    let mut event = timed_event((2025, 1, 10, 14, 0), (2025, 1, 10, 15, 0));
    event.reminder_at = Some(Utc.with_ymd_and_hms(2025, 1, 10, 13, 30, 0).unwrap());
    event.repeat = RepeatOption::Custom;
    event.custom_dates = vec![day(2025, 1, 10), day(2025, 1, 20)];
    event.custom_times.insert(
        day(2025, 1, 20),
        CustomTime {
            start: Utc.with_ymd_and_hms(2025, 1, 20, 8, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 1, 20, 9, 30, 0).unwrap(),
            reminder_at: Some(Utc.with_ymd_and_hms(2025, 1, 20, 7, 45, 0).unwrap()),
            repeat: RepeatOption::None,
        },
    );

    let occurrences = materialize(&event);
    assert_eq!(occurrences.len(), 2);

    // Un-overridden date keeps the event's default window and reminder.
    assert_eq!(
        occurrences[0].start,
        Utc.with_ymd_and_hms(2025, 1, 10, 14, 0, 0).unwrap()
    );
    assert_eq!(
        occurrences[0].reminder_at,
        Some(Utc.with_ymd_and_hms(2025, 1, 10, 13, 30, 0).unwrap())
    );

    // Overridden date takes its own window and reminder.
    assert_eq!(
        occurrences[1].start,
        Utc.with_ymd_and_hms(2025, 1, 20, 8, 0, 0).unwrap()
    );
    assert_eq!(
        occurrences[1].end,
        Utc.with_ymd_and_hms(2025, 1, 20, 9, 30, 0).unwrap()
    );
    assert_eq!(
        occurrences[1].reminder_at,
        Some(Utc.with_ymd_and_hms(2025, 1, 20, 7, 45, 0).unwrap())
    );
}

#[test]
fn custom_all_day_dates_anchor_to_each_date() {
    let mut event = CanonicalEvent::new("e1", "u1", "Event", day(2025, 1, 10));
    event.is_all_day = true;
    event.start_at = Some(Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap());
    event.end_at = Some(Utc.with_ymd_and_hms(2025, 1, 10, 13, 0, 0).unwrap());
    event.repeat = RepeatOption::Custom;
    event.custom_dates = vec![day(2025, 1, 10), day(2025, 1, 25)];

    let occurrences = materialize(&event);
    assert_eq!(
        occurrences[1].start,
        Utc.with_ymd_and_hms(2025, 1, 25, 12, 0, 0).unwrap()
    );
    assert_eq!(
        occurrences[1].end,
        Utc.with_ymd_and_hms(2025, 1, 25, 13, 0, 0).unwrap()
    );
}

// ---------------------------------------------------------------------------
// Stepped recurrence
// ---------------------------------------------------------------------------

#[test]
fn weekly_recurrence_includes_instance_on_end_date() {
    let mut event = CanonicalEvent::new("e2", "u1", "Weekly", day(2025, 1, 1));
    event.start_at = Some(Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap());
    event.end_at = Some(Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap());
    event.repeat = RepeatOption::Weekly;
    event.repeat_end = Some(day(2025, 1, 22));

    let occurrences = materialize(&event);
    let dates: Vec<NaiveDate> = occurrences.iter().map(|o| o.date_key).collect();
    assert_eq!(
        dates,
        vec![day(2025, 1, 1), day(2025, 1, 8), day(2025, 1, 15), day(2025, 1, 22)]
    );
}

#[test]
fn recurring_instances_share_the_base_id() {
    let mut event = CanonicalEvent::new("e2", "u1", "Weekly", day(2025, 1, 1));
    event.repeat = RepeatOption::Weekly;
    event.repeat_end = Some(day(2025, 1, 22));

    let occurrences = materialize(&event);
    assert_eq!(occurrences.len(), 4);
    for occurrence in &occurrences {
        assert_eq!(occurrence.occurrence_id, "e2");
        assert_eq!(occurrence.base_id, "e2");
    }
}

#[test]
fn unbounded_daily_recurrence_caps_at_limit() {
    let mut event = CanonicalEvent::new("e1", "u1", "Daily", day(2025, 1, 1));
    event.start_at = Some(Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap());
    event.repeat = RepeatOption::Daily;

    let occurrences = materialize(&event);
    assert_eq!(occurrences.len(), RECURRENCE_CAP);
}

#[test]
fn cap_applies_even_with_a_far_repeat_end() {
    let mut event = CanonicalEvent::new("e1", "u1", "Daily", day(2025, 1, 1));
    event.repeat = RepeatOption::Daily;
    event.repeat_end = Some(day(2099, 1, 1));

    assert_eq!(materialize(&event).len(), RECURRENCE_CAP);
}

#[test]
fn missing_repeat_end_defaults_to_one_year() {
    let mut event = CanonicalEvent::new("e1", "u1", "Weekly", day(2025, 1, 1));
    event.start_at = Some(Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap());
    event.repeat = RepeatOption::Weekly;

    let occurrences = materialize(&event);
    // 52 weekly steps from the anchor land on 2025-12-31; the next would
    // overshoot 2026-01-01.
    assert_eq!(occurrences.len(), 53);
    assert_eq!(occurrences.last().unwrap().date_key, day(2025, 12, 31));
}

#[test]
fn monthly_recurrence_clamps_to_shorter_months() {
    let mut event = CanonicalEvent::new("e1", "u1", "Monthly", day(2025, 1, 31));
    event.repeat = RepeatOption::Monthly;
    event.repeat_end = Some(day(2025, 4, 30));

    let dates: Vec<NaiveDate> = materialize(&event).iter().map(|o| o.date_key).collect();
    // Clamping at February sticks for the following steps.
    assert_eq!(
        dates,
        vec![day(2025, 1, 31), day(2025, 2, 28), day(2025, 3, 28), day(2025, 4, 28)]
    );
}

#[test]
fn yearly_recurrence_clamps_leap_day() {
    let mut event = CanonicalEvent::new("e1", "u1", "Yearly", day(2024, 2, 29));
    event.repeat = RepeatOption::Yearly;
    event.repeat_end = Some(day(2026, 12, 31));

    let dates: Vec<NaiveDate> = materialize(&event).iter().map(|o| o.date_key).collect();
    assert_eq!(dates, vec![day(2024, 2, 29), day(2025, 2, 28), day(2026, 2, 28)]);
}

#[test]
fn anchor_instance_is_emitted_even_when_repeat_end_precedes_it() {
    let mut event = CanonicalEvent::new("e1", "u1", "Daily", day(2025, 6, 1));
    event.repeat = RepeatOption::Daily;
    event.repeat_end = Some(day(2025, 5, 1));

    let occurrences = materialize(&event);
    assert_eq!(occurrences.len(), 1);
    assert_eq!(occurrences[0].date_key, day(2025, 6, 1));
}

#[test]
fn recurrence_preserves_time_of_day_and_duration() {
    let mut event = CanonicalEvent::new("e1", "u1", "Daily", day(2025, 1, 1));
    event.start_at = Some(Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap());
    event.end_at = Some(Utc.with_ymd_and_hms(2025, 1, 1, 10, 30, 0).unwrap());
    event.repeat = RepeatOption::Daily;
    event.repeat_end = Some(day(2025, 1, 3));

    let occurrences = materialize(&event);
    assert_eq!(occurrences.len(), 3);
    assert_eq!(
        occurrences[2].start,
        Utc.with_ymd_and_hms(2025, 1, 3, 9, 0, 0).unwrap()
    );
    assert_eq!(
        occurrences[2].end,
        Utc.with_ymd_and_hms(2025, 1, 3, 10, 30, 0).unwrap()
    );
}

#[test]
fn recurrence_shifts_reminder_by_the_anchor_offset() {
    let mut event = CanonicalEvent::new("e1", "u1", "Daily", day(2025, 1, 1));
    event.start_at = Some(Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap());
    event.reminder_at = Some(Utc.with_ymd_and_hms(2025, 1, 1, 8, 30, 0).unwrap());
    event.repeat = RepeatOption::Daily;
    event.repeat_end = Some(day(2025, 1, 2));

    let occurrences = materialize(&event);
    assert_eq!(
        occurrences[1].reminder_at,
        Some(Utc.with_ymd_and_hms(2025, 1, 2, 8, 30, 0).unwrap())
    );
}

// ---------------------------------------------------------------------------
// Output ordering
// ---------------------------------------------------------------------------

#[test]
fn output_is_sorted_by_date_even_for_unordered_custom_dates() {
    let mut event = CanonicalEvent::new("e1", "u1", "Custom", day(2025, 1, 10));
    event.repeat = RepeatOption::Custom;
    event.custom_dates = vec![day(2025, 3, 1), day(2025, 1, 5), day(2025, 2, 14)];

    let dates: Vec<NaiveDate> = materialize(&event).iter().map(|o| o.date_key).collect();
    assert_eq!(dates, vec![day(2025, 1, 5), day(2025, 2, 14), day(2025, 3, 1)]);
}
