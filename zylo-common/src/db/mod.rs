//! Database initialization and queries
//!
//! Ids are stored as UUID text and timestamps as fixed-width RFC 3339 text
//! (microsecond precision, `Z` suffix) so that lexical order is time order.

pub mod djs;
pub mod init;
pub mod library;
pub mod mixes;
pub mod users;

pub use init::*;

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::{Error, Result};

pub(crate) fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid stored timestamp '{}': {}", raw, e)))
}

pub(crate) fn decode_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| Error::Internal(format!("Invalid stored id '{}': {}", raw, e)))
}

pub(crate) fn encode_list(values: &[String]) -> String {
    serde_json::Value::from(values.to_vec()).to_string()
}

pub(crate) fn decode_list(raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw)
        .map_err(|e| Error::Internal(format!("Invalid stored list '{}': {}", raw, e)))
}
