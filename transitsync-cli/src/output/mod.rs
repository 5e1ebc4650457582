//! Output formatting for CLI.

mod json;
mod text;

pub use json::{DetailOutput, JsonFormatter, VehicleListOutput};
pub use text::TextFormatter;

use chrono::{DateTime, Local};

/// Formats an upstream timestamp as local time, e.g. `Jan 15, 14:30:00`.
///
/// Values that are not RFC 3339 are returned unchanged.
pub fn format_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_string(),
        |dt| dt.with_timezone(&Local).format("%b %d, %H:%M:%S").to_string(),
    )
}
