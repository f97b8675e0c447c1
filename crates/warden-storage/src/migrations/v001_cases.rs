//! v001: cases.

use rusqlite::Connection;

use warden_core::errors::WardenResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> WardenResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS cases (
            id                      TEXT PRIMARY KEY,
            profile_id              TEXT NOT NULL,
            url                     TEXT NOT NULL,
            platform                TEXT NOT NULL,
            content_type            TEXT NOT NULL,
            confidence              REAL NOT NULL,
            similarity              REAL NOT NULL,
            priority                TEXT NOT NULL,
            priority_rank           REAL NOT NULL,
            status                  TEXT NOT NULL,
            signals                 TEXT NOT NULL DEFAULT '{}',
            jurisdiction            TEXT,
            detected_at             TEXT NOT NULL,
            updated_at              TEXT NOT NULL,
            takedown_request_id     TEXT,
            version                 INTEGER NOT NULL DEFAULT 0,
            decided_policy_version  INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_cases_status ON cases(status);
        CREATE INDEX IF NOT EXISTS idx_cases_platform ON cases(platform COLLATE NOCASE);
        CREATE INDEX IF NOT EXISTS idx_cases_profile ON cases(profile_id);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
