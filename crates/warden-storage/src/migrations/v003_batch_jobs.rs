//! v003: batch_jobs (audit trail of bulk operations).

use rusqlite::Connection;

use warden_core::errors::WardenResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> WardenResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS batch_jobs (
            id               TEXT PRIMARY KEY,
            action           TEXT NOT NULL,
            status           TEXT NOT NULL,
            case_ids         TEXT NOT NULL,
            outcomes         TEXT NOT NULL,
            max_concurrency  INTEGER NOT NULL,
            created_at       TEXT NOT NULL,
            completed_at     TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_batch_status ON batch_jobs(status);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
