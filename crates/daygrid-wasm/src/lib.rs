//! WASM bindings for the daygrid calendar engine.
//!
//! Exposes occurrence expansion, date-index building, and per-day views to
//! JavaScript via `wasm-bindgen`. All structured data crosses the boundary as
//! JSON strings: event rows in the store's wire shape, occurrences and
//! indexes in the engine's serialized form.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p daygrid-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir pkg/ \
//!   target/wasm32-unknown-unknown/release/daygrid_wasm.wasm
//! ```

use chrono::NaiveDate;
use daygrid_core::{
    display_order, index_from_records, materialize, EventRecord, Occurrence, SharedEventRecord,
};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// JSON input shapes
// ---------------------------------------------------------------------------

/// Calendar payload passed from JavaScript: the viewer's event rows plus any
/// shared rows they appear in.
#[derive(Default, Deserialize)]
struct CalendarInput {
    #[serde(default)]
    events: Vec<EventRecord>,
    #[serde(default)]
    shared_events: Vec<SharedEventRecord>,
}

fn parse_events(json: &str) -> Result<Vec<EventRecord>, JsValue> {
    serde_json::from_str(json)
        .map_err(|e| JsValue::from_str(&format!("Invalid event rows JSON: {}", e)))
}

fn parse_input(json: &str) -> Result<CalendarInput, JsValue> {
    serde_json::from_str(json)
        .map_err(|e| JsValue::from_str(&format!("Invalid calendar JSON: {}", e)))
}

fn parse_date(s: &str) -> Result<NaiveDate, JsValue> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| JsValue::from_str(&format!("Invalid date '{}': {}", s, e)))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Materialize event rows into dated occurrences.
///
/// `events_json` must be a JSON array of event rows in the store's wire
/// shape. Returns a JSON array of occurrences ordered by date then start.
/// Malformed timestamps inside a row degrade to an all-day occurrence; only
/// unreadable JSON is an error.
#[wasm_bindgen(js_name = "materializeEvents")]
pub fn materialize_events(events_json: &str) -> Result<String, JsValue> {
    let rows = parse_events(events_json)?;

    let mut occurrences: Vec<Occurrence> = Vec::new();
    for row in rows {
        occurrences.extend(materialize(&row.into_event()));
    }
    occurrences.sort_by(|a, b| a.date_key.cmp(&b.date_key).then(a.start.cmp(&b.start)));

    to_json(&occurrences)
}

/// Build the full `date -> occurrences` index for one viewing user.
///
/// `calendar_json` is `{"events": [...], "shared_events": [...]}`. Pending
/// rows the viewer sent badge their own events; accepted rows they received
/// materialize from the stored snapshot; everything else stays invisible.
/// Returns the index as a JSON object keyed by `YYYY-MM-DD`.
#[wasm_bindgen(js_name = "buildDateIndex")]
pub fn build_date_index(calendar_json: &str, viewer: &str) -> Result<String, JsValue> {
    let input = parse_input(calendar_json)?;
    let index = index_from_records(input.events, input.shared_events, viewer);
    to_json(&index)
}

/// One day's occurrences in display order (all-day entries first, then by
/// start instant).
///
/// Same input as [`build_date_index`] plus the `YYYY-MM-DD` date to view.
/// Returns a JSON array, empty when the day is clear.
#[wasm_bindgen(js_name = "dayView")]
pub fn day_view(calendar_json: &str, viewer: &str, date: &str) -> Result<String, JsValue> {
    let date = parse_date(date)?;
    let input = parse_input(calendar_json)?;
    let index = index_from_records(input.events, input.shared_events, viewer);

    let mut day = index.day(date).to_vec();
    display_order(&mut day);
    to_json(&day)
}

/// Recover the base event id from a composed occurrence id
/// (`evt_2025-01-16` -> `evt`). Ids without a date suffix pass through.
#[wasm_bindgen(js_name = "baseIdOf")]
pub fn base_id_of(occurrence_id: &str) -> String {
    daygrid_core::base_id_of(occurrence_id).to_owned()
}
