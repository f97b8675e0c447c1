//! Batch job audit records.

use rusqlite::{params, Connection, OptionalExtension};

use warden_core::errors::WardenResult;
use warden_core::models::{BatchJob, ItemOutcome};

use crate::{corrupt, fmt_ts, parse_opt_ts, parse_ts, to_storage_err};

pub fn upsert_batch_job(conn: &Connection, job: &BatchJob) -> WardenResult<()> {
    let case_ids = serde_json::to_string(&job.case_ids)?;
    let outcomes = serde_json::to_string(&job.outcomes)?;
    conn.execute(
        "INSERT INTO batch_jobs (
            id, action, status, case_ids, outcomes, max_concurrency, created_at, completed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(id) DO UPDATE SET
            status = excluded.status,
            outcomes = excluded.outcomes,
            completed_at = excluded.completed_at",
        params![
            job.id,
            job.action.as_str(),
            job.status.as_str(),
            case_ids,
            outcomes,
            job.max_concurrency as i64,
            fmt_ts(job.created_at),
            job.completed_at.map(fmt_ts),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn get_batch_job(conn: &Connection, id: &str) -> WardenResult<Option<BatchJob>> {
    type Raw = (String, String, String, String, String, i64, String, Option<String>);
    let raw: Option<Raw> = conn
        .query_row(
            "SELECT id, action, status, case_ids, outcomes, max_concurrency, created_at, completed_at
             FROM batch_jobs WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                ))
            },
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    let Some((id, action, status, case_ids, outcomes, max_concurrency, created_at, completed_at)) =
        raw
    else {
        return Ok(None);
    };

    let case_ids: Vec<String> = serde_json::from_str(&case_ids).map_err(|e| corrupt(&id, e))?;
    let outcomes: Vec<ItemOutcome> =
        serde_json::from_str(&outcomes).map_err(|e| corrupt(&id, e))?;
    Ok(Some(BatchJob {
        action: action.parse().map_err(|e| corrupt(&id, e))?,
        status: status.parse().map_err(|e| corrupt(&id, e))?,
        max_concurrency: max_concurrency as usize,
        created_at: parse_ts(&id, &created_at)?,
        completed_at: parse_opt_ts(&id, completed_at)?,
        case_ids,
        outcomes,
        id,
    }))
}
