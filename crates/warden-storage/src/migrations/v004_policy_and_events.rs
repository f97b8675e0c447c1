//! v004: policy_versions, case_events.

use rusqlite::Connection;

use warden_core::errors::WardenResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> WardenResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS policy_versions (
            version     INTEGER PRIMARY KEY,
            policy      TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS case_events (
            case_id     TEXT NOT NULL,
            sequence    INTEGER NOT NULL,
            event_type  TEXT NOT NULL,
            payload     TEXT NOT NULL DEFAULT '{}',
            emitted_at  TEXT NOT NULL,
            PRIMARY KEY (case_id, sequence)
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
