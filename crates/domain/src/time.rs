//! Wire timestamps used by telemetry range queries.

use chrono::NaiveDateTime;

use crate::error::ValidationError;

/// Format of `startTs` / `endTs` query parameters, e.g. `2020-12-06 20:01:02`.
pub const WIRE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a wire timestamp.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidTimestamp`] when `value` does not
/// follow [`WIRE_FORMAT`].
pub fn parse_wire(value: &str) -> Result<NaiveDateTime, ValidationError> {
    NaiveDateTime::parse_from_str(value, WIRE_FORMAT).map_err(|_| {
        ValidationError::InvalidTimestamp {
            value: value.to_string(),
        }
    })
}

/// Render a timestamp in [`WIRE_FORMAT`].
#[must_use]
pub fn format_wire(ts: NaiveDateTime) -> String {
    ts.format(WIRE_FORMAT).to_string()
}
