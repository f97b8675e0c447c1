//! v002: takedown_requests with at most one active request per case.

use rusqlite::Connection;

use warden_core::errors::WardenResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> WardenResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS takedown_requests (
            id                   TEXT PRIMARY KEY,
            case_id              TEXT NOT NULL REFERENCES cases(id),
            platform             TEXT NOT NULL,
            status               TEXT NOT NULL,
            idempotency_key      TEXT NOT NULL UNIQUE,
            created_at           TEXT NOT NULL,
            sent_at              TEXT,
            acknowledged_at      TEXT,
            responded_at         TEXT,
            compliance_deadline  TEXT,
            retry_count          INTEGER NOT NULL DEFAULT 0,
            last_error           TEXT,
            policy_version       INTEGER NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_takedown_one_active
            ON takedown_requests(case_id)
            WHERE status IN ('pending', 'sent', 'acknowledged');
        CREATE INDEX IF NOT EXISTS idx_takedown_case ON takedown_requests(case_id);
        CREATE INDEX IF NOT EXISTS idx_takedown_deadline
            ON takedown_requests(compliance_deadline)
            WHERE status IN ('sent', 'acknowledged');
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
