//! Saved-message export.
//!
//! The companion mode: collect saved/bookmarked messages from the page
//! and format them as CSV or TSV, optionally enriching each row with an
//! AI-generated "next action" title/detail pair.

pub mod collect;
pub mod exporter;
pub mod table;

pub use collect::{SavedItem, SavedItemCollector};
pub use exporter::{ExportFormat, ExportOutput, Exporter};
pub use table::{BASIC_HEADER, DETAILED_HEADER};
