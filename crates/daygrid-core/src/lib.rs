//! # daygrid-core
//!
//! Calendar materialization and reconciliation: canonical event records in,
//! a consistent per-date occurrence index out.
//!
//! The engine is pure. Expanding an event into dated occurrences, applying
//! the sharing visibility rules, and folding multiple occurrence streams
//! into one index all happen without I/O; stores, transports, and render
//! surfaces live in the crates built on top of this one.
//!
//! ## Modules
//!
//! - [`event`]: canonical event model and effective-time rules
//! - [`materializer`]: one event expanded into its dated occurrence set
//! - [`occurrence`]: derived occurrences and display ordering
//! - [`share`]: sharing state machine and visibility rules
//! - [`date_index`]: `date -> occurrences` index and stream reconciliation
//! - [`records`]: wire rows for the `events` / `shared_events` tables
//! - [`datetime`]: date-key, instant, and all-day anchor helpers
//! - [`error`]: sharing-rule violations

pub mod date_index;
pub mod datetime;
pub mod error;
pub mod event;
pub mod materializer;
pub mod occurrence;
pub mod records;
pub mod share;

pub use date_index::{build_index, DateIndex, SharedSnapshot};
pub use error::{Result, ShareError};
pub use event::{CanonicalEvent, CustomTime, EventCategory, RepeatOption};
pub use materializer::{materialize, span_days, RECURRENCE_CAP};
pub use occurrence::{base_id_of, display_order, Occurrence, ShareAnnotation, ShareDirection};
pub use records::{index_from_records, EventRecord, SharedEventRecord};
pub use share::{
    authorize, fork_snapshot, visibility, ShareAction, SharedEvent, ShareStatus, ShareVisibility,
};
