//! Schema migrations, applied in order and recorded in `schema_version`.

mod v001_cases;
mod v002_takedown_requests;
mod v003_batch_jobs;
mod v004_policy_and_events;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use warden_core::errors::{StorageError, WardenError, WardenResult};

use crate::to_storage_err;

type Migration = fn(&Connection) -> WardenResult<()>;

const MIGRATIONS: &[(u32, Migration)] = &[
    (1, v001_cases::migrate),
    (2, v002_takedown_requests::migrate),
    (3, v003_batch_jobs::migrate),
    (4, v004_policy_and_events::migrate),
];

/// Latest schema version known to this build.
pub const LATEST_VERSION: u32 = 4;

/// Apply every migration newer than the recorded schema version.
pub fn run_migrations(conn: &Connection) -> WardenResult<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    let current = current_version(conn)?;
    for (version, migrate) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| to_storage_err(format!("migration {version} begin: {e}")))?;
        migrate(&tx).map_err(|e| {
            WardenError::StorageError(StorageError::MigrationFailed {
                version: *version,
                reason: e.to_string(),
            })
        })?;
        tx.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            params![version],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
        tx.commit()
            .map_err(|e| to_storage_err(format!("migration {version} commit: {e}")))?;
        info!(version, "applied schema migration");
    }
    Ok(LATEST_VERSION.max(current))
}

/// Highest applied migration, 0 for a fresh database.
pub fn current_version(conn: &Connection) -> WardenResult<u32> {
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?
        .flatten();
    Ok(version.unwrap_or(0))
}
