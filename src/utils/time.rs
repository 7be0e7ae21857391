//! Timestamp helpers.
//!
//! All timestamps stored by the pipeline use a fixed-width, zero-padded
//! `YYYY-MM-DD HH:MM:SS` local-time format so SQLite can sort and compare
//! them as plain text.

use chrono::{DateTime, Local, TimeZone};

pub const SORTABLE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert epoch seconds (as received on the wire) into the sortable
/// local-time text form. Out-of-range epochs fall back to "now" rather
/// than poisoning the event.
pub fn format_epoch_sortable(epoch: i64) -> String {
    let dt: DateTime<Local> = match Local.timestamp_opt(epoch, 0) {
        chrono::LocalResult::Single(dt) => dt,
        chrono::LocalResult::Ambiguous(dt, _) => dt,
        chrono::LocalResult::None => Local::now(),
    };
    dt.format(SORTABLE_FORMAT).to_string()
}

/// Current local time in the sortable text form.
pub fn now_sortable() -> String {
    Local::now().format(SORTABLE_FORMAT).to_string()
}
