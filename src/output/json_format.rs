//! JSON output formatting.

use serde::Serialize;
use std::io;

/// Pretty-printed JSON for any report.
pub fn to_json<T: Serialize>(value: &T) -> io::Result<String> {
    serde_json::to_string_pretty(value).map_err(io::Error::other)
}
