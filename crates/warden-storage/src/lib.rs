//! # warden-storage
//!
//! Reference implementation of the case store on SQLite.
//! The store is the only component that persists state; status writes go
//! through a compare-and-swap on `(status, version)`.

pub mod connection;
pub mod engine;
pub mod migrations;
pub mod pragmas;
pub mod queries;

pub use engine::StorageEngine;

use chrono::{DateTime, SecondsFormat, Utc};
use warden_core::errors::{StorageError, WardenError};

/// Helper to convert any error message into a `WardenError::StorageError`.
pub fn to_storage_err(msg: String) -> WardenError {
    WardenError::StorageError(StorageError::SqliteError { message: msg })
}

/// Fixed-width UTC timestamp so text comparison in SQL matches time order.
pub(crate) fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_ts(id: &str, raw: &str) -> Result<DateTime<Utc>, WardenError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            WardenError::StorageError(StorageError::CorruptRecord {
                id: id.to_string(),
                details: format!("bad timestamp {raw:?}: {e}"),
            })
        })
}

pub(crate) fn parse_opt_ts(id: &str, raw: Option<String>) -> Result<Option<DateTime<Utc>>, WardenError> {
    raw.map(|r| parse_ts(id, &r)).transpose()
}

pub(crate) fn corrupt(id: &str, details: impl std::fmt::Display) -> WardenError {
    WardenError::StorageError(StorageError::CorruptRecord {
        id: id.to_string(),
        details: details.to_string(),
    })
}
