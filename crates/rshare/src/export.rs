//! History export as CSV or a printable HTML table.

use std::fmt::Write as _;

use chrono::{DateTime, Local, SecondsFormat, Utc};

use crate::error::{Error, Result};
use crate::ride::HistoryEntry;

/// Header line of the CSV export.
pub const CSV_HEADER: &str = "from,to,completedAt,rating";

/// Default file name for a CSV export.
pub const CSV_FILE_NAME: &str = "rshare_history.csv";

/// Default file name for an HTML export.
pub const HTML_FILE_NAME: &str = "rshare_history.html";

/// Quote a CSV field, doubling any embedded quotes.
#[must_use]
pub fn escape_csv(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Format a timestamp the way the CSV export expects, e.g. `2024-01-01T00:00:00.000Z`.
#[must_use]
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Format a timestamp in local time for people to read.
#[must_use]
pub fn local_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn escape_html(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#39;".to_string(),
            c => c.to_string(),
        })
        .collect()
}

/// Render the history as CSV.
///
/// Rows are joined by newlines with no trailing newline. Locations are always
/// quoted; ratings are written as-is.
///
/// # Errors
///
/// Returns `EmptyHistory` if there is nothing to export.
pub fn history_csv(history: &[HistoryEntry]) -> Result<String> {
    if history.is_empty() {
        return Err(Error::EmptyHistory);
    }

    let mut out = String::from(CSV_HEADER);
    for entry in history {
        let _ = write!(
            out,
            "\n{},{},{},{}",
            escape_csv(&entry.from),
            escape_csv(&entry.to),
            iso_timestamp(entry.completed_at),
            entry.rating
        );
    }
    Ok(out)
}

/// Render the history as an HTML table suitable for printing.
///
/// # Errors
///
/// Returns `EmptyHistory` if there is nothing to export.
pub fn history_html(history: &[HistoryEntry]) -> Result<String> {
    if history.is_empty() {
        return Err(Error::EmptyHistory);
    }

    let mut out = String::from(
        "<h2>RShare History</h2>\
         <table border=1 style='width:100%;border-collapse:collapse'>\
         <tr><th>From</th><th>To</th><th>Date</th><th>Rating</th></tr>",
    );
    for entry in history {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&entry.from),
            escape_html(&entry.to),
            local_timestamp(entry.completed_at),
            escape_html(&entry.rating)
        );
    }
    out.push_str("</table>");
    Ok(out)
}
