//! `daygrid` CLI: expand calendar events and render date indexes from the
//! command line.
//!
//! ## Usage
//!
//! ```sh
//! # Materialize event rows into dated occurrences (stdin -> stdout)
//! daygrid expand -i events.json
//!
//! # Only the occurrences landing on one date
//! daygrid expand -i events.json --on 2025-01-16
//!
//! # Build the date -> occurrences index for a viewing user
//! daygrid index -i calendar.json --user u1
//!
//! # Render a month as a text agenda
//! daygrid agenda -i calendar.json --user u1 --month 2025-01
//! ```
//!
//! Input is either a bare JSON array of event rows or a document of the form
//! `{"user_id": ..., "events": [...], "shared_events": [...]}`. The viewing
//! user decides which shared rows reach the index: pending invitations badge
//! the sender's own events and stay invisible to the recipient.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use daygrid_core::datetime::month_end;
use daygrid_core::{
    display_order, index_from_records, materialize, span_days, EventRecord, Occurrence,
    ShareDirection, SharedEventRecord,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::{self, Read};

#[derive(Parser)]
#[command(
    name = "daygrid",
    version,
    about = "Calendar occurrence engine CLI",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Materialize event rows into their dated occurrences
    Expand {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Keep only occurrences landing on this date (YYYY-MM-DD)
        #[arg(long)]
        on: Option<String>,
    },
    /// Build the date -> occurrences index as JSON
    Index {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Viewing user (defaults to the document's user_id)
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Render the index as a human-readable agenda
    Agenda {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Viewing user (defaults to the document's user_id)
        #[arg(short, long)]
        user: Option<String>,
        /// Restrict to one month (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,
    },
}

/// Parsed input: a bare array of event rows, or the full document shape.
#[derive(Default, Deserialize)]
struct CalendarDocument {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    events: Vec<EventRecord>,
    #[serde(default)]
    shared_events: Vec<SharedEventRecord>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Expand { input, output, on } => {
            let document = parse_document(&read_input(input.as_deref())?)?;
            let filter = on.as_deref().map(parse_cli_date).transpose()?;

            let mut occurrences: Vec<Occurrence> = Vec::new();
            for row in document.events {
                occurrences.extend(materialize(&row.into_event()));
            }
            if let Some(date) = filter {
                occurrences.retain(|occurrence| occurrence.date_key == date);
            }
            occurrences.sort_by(|a, b| {
                a.date_key
                    .cmp(&b.date_key)
                    .then(a.start.cmp(&b.start))
                    .then_with(|| a.base_id.cmp(&b.base_id))
            });

            let pretty = serde_json::to_string_pretty(&occurrences)?;
            write_output(output.as_deref(), &pretty)?;
        }
        Commands::Index {
            input,
            output,
            user,
        } => {
            let document = parse_document(&read_input(input.as_deref())?)?;
            let viewer = resolve_viewer(user, &document)?;
            let index = index_from_records(document.events, document.shared_events, &viewer);

            let pretty = serde_json::to_string_pretty(&index)?;
            write_output(output.as_deref(), &pretty)?;
        }
        Commands::Agenda { input, user, month } => {
            let document = parse_document(&read_input(input.as_deref())?)?;
            let viewer = resolve_viewer(user, &document)?;
            print!("{}", render_agenda(document, &viewer, month.as_deref())?);
        }
    }

    Ok(())
}

/// Render one line per occurrence, grouped by date in display order. With a
/// month given, only that month's dates print under a `January 2025` header;
/// otherwise every date in the index prints.
fn render_agenda(document: CalendarDocument, viewer: &str, month: Option<&str>) -> Result<String> {
    // Multi-day bases, looked up while rendering to label each day of a span.
    let mut spans: HashMap<String, (NaiveDate, u32)> = HashMap::new();
    for row in &document.events {
        let event = row.clone().into_event();
        if event.is_multi_day() {
            spans.insert(
                event.id.clone(),
                (event.effective_start().date_naive(), span_days(&event)),
            );
        }
    }
    for row in &document.shared_events {
        let snapshot = row.clone().into_share().snapshot;
        if snapshot.is_multi_day() {
            spans.insert(
                snapshot.id.clone(),
                (snapshot.effective_start().date_naive(), span_days(&snapshot)),
            );
        }
    }

    let index = index_from_records(document.events, document.shared_events, viewer);

    let mut out = String::new();
    let window = match month {
        Some(raw) => {
            let first = parse_cli_month(raw)?;
            out.push_str(&format!("{}\n\n", first.format("%B %Y")));
            (first, month_end(first))
        }
        None => match (index.dates().next(), index.dates().last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Ok(out),
        },
    };

    for (date, occurrences) in index.range(window.0, window.1) {
        let mut day = occurrences.to_vec();
        display_order(&mut day);
        for occurrence in &day {
            out.push_str(&agenda_line(date, occurrence, &spans));
        }
    }

    Ok(out)
}

fn agenda_line(
    date: NaiveDate,
    occurrence: &Occurrence,
    spans: &HashMap<String, (NaiveDate, u32)>,
) -> String {
    let time = if occurrence.is_all_day {
        "[all-day]".to_owned()
    } else {
        occurrence.start.format("%H:%M").to_string()
    };

    let mut line = format!("{}  {:<9}  {}", date, time, occurrence.title);

    if let Some((first_day, total)) = spans.get(&occurrence.base_id) {
        let nth = (date - *first_day).num_days() + 1;
        line.push_str(&format!("  (day {} of {})", nth, total));
    }
    if let Some(badge) = &occurrence.sharing {
        match badge.direction {
            ShareDirection::Sent => line.push_str("  [pending]"),
            ShareDirection::Received => {
                let name = badge
                    .shared_by_display_name
                    .as_deref()
                    .unwrap_or(&badge.shared_by);
                line.push_str(&format!("  [shared by {}]", name));
            }
        }
    }

    line.push('\n');
    line
}

fn parse_document(json: &str) -> Result<CalendarDocument> {
    let value: serde_json::Value =
        serde_json::from_str(json).context("Failed to parse input as JSON")?;
    if value.is_array() {
        let events = serde_json::from_value(value).context("Failed to parse event rows")?;
        return Ok(CalendarDocument {
            events,
            ..CalendarDocument::default()
        });
    }
    serde_json::from_value(value).context("Failed to parse calendar document")
}

/// The viewing user: the --user flag, else the document's user_id. Input
/// without either is fine as long as it carries no shared rows, which are
/// meaningless without a viewpoint.
fn resolve_viewer(flag: Option<String>, document: &CalendarDocument) -> Result<String> {
    if let Some(user) = flag.or_else(|| document.user_id.clone()) {
        return Ok(user);
    }
    if document.shared_events.is_empty() {
        return Ok(String::new());
    }
    bail!("Input carries shared_events but no viewing user; pass --user or set user_id")
}

fn parse_cli_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw))
}

fn parse_cli_month(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", raw))
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
