//! Takedown request persistence.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use warden_core::errors::{TransitionError, WardenError, WardenResult};
use warden_core::models::TakedownRequest;

use crate::{corrupt, fmt_ts, parse_opt_ts, parse_ts, to_storage_err};

const TAKEDOWN_COLUMNS: &str = "id, case_id, platform, status, idempotency_key, created_at,
    sent_at, acknowledged_at, responded_at, compliance_deadline, retry_count, last_error,
    policy_version";

struct TakedownRow {
    id: String,
    case_id: String,
    platform: String,
    status: String,
    idempotency_key: String,
    created_at: String,
    sent_at: Option<String>,
    acknowledged_at: Option<String>,
    responded_at: Option<String>,
    compliance_deadline: Option<String>,
    retry_count: i64,
    last_error: Option<String>,
    policy_version: i64,
}

impl TakedownRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            case_id: row.get(1)?,
            platform: row.get(2)?,
            status: row.get(3)?,
            idempotency_key: row.get(4)?,
            created_at: row.get(5)?,
            sent_at: row.get(6)?,
            acknowledged_at: row.get(7)?,
            responded_at: row.get(8)?,
            compliance_deadline: row.get(9)?,
            retry_count: row.get(10)?,
            last_error: row.get(11)?,
            policy_version: row.get(12)?,
        })
    }

    fn into_request(self) -> WardenResult<TakedownRequest> {
        Ok(TakedownRequest {
            status: self.status.parse().map_err(|e| corrupt(&self.id, e))?,
            created_at: parse_ts(&self.id, &self.created_at)?,
            sent_at: parse_opt_ts(&self.id, self.sent_at)?,
            acknowledged_at: parse_opt_ts(&self.id, self.acknowledged_at)?,
            responded_at: parse_opt_ts(&self.id, self.responded_at)?,
            compliance_deadline: parse_opt_ts(&self.id, self.compliance_deadline)?,
            retry_count: self.retry_count as u32,
            policy_version: self.policy_version as u64,
            id: self.id,
            case_id: self.case_id,
            platform: self.platform,
            idempotency_key: self.idempotency_key,
            last_error: self.last_error,
        })
    }
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation)
}

/// Insert a new request, refusing a second active request for the same case.
pub fn insert_takedown(conn: &Connection, request: &TakedownRequest) -> WardenResult<()> {
    if request.status.is_active() {
        if let Some(active) = active_for_case(conn, &request.case_id)? {
            return Err(active_exists(&active));
        }
    }

    let result = conn.execute(
        &format!(
            "INSERT INTO takedown_requests ({TAKEDOWN_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
        ),
        params![
            request.id,
            request.case_id,
            request.platform,
            request.status.as_str(),
            request.idempotency_key,
            fmt_ts(request.created_at),
            request.sent_at.map(fmt_ts),
            request.acknowledged_at.map(fmt_ts),
            request.responded_at.map(fmt_ts),
            request.compliance_deadline.map(fmt_ts),
            request.retry_count,
            request.last_error,
            request.policy_version as i64,
        ],
    );

    match result {
        Ok(_) => Ok(()),
        // Another writer slipped an active request in between the check and the insert.
        Err(e) if is_constraint_violation(&e) => match active_for_case(conn, &request.case_id)? {
            Some(active) => Err(active_exists(&active)),
            None => Err(to_storage_err(e.to_string())),
        },
        Err(e) => Err(to_storage_err(e.to_string())),
    }
}

/// Overwrite the mutable fields of an existing request.
pub fn update_takedown(conn: &Connection, request: &TakedownRequest) -> WardenResult<()> {
    let updated = conn
        .execute(
            "UPDATE takedown_requests SET
                status = ?1,
                sent_at = ?2,
                acknowledged_at = ?3,
                responded_at = ?4,
                compliance_deadline = ?5,
                retry_count = ?6,
                last_error = ?7
             WHERE id = ?8",
            params![
                request.status.as_str(),
                request.sent_at.map(fmt_ts),
                request.acknowledged_at.map(fmt_ts),
                request.responded_at.map(fmt_ts),
                request.compliance_deadline.map(fmt_ts),
                request.retry_count,
                request.last_error,
                request.id,
            ],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    if updated == 0 {
        return Err(WardenError::TakedownNotFound {
            id: request.id.clone(),
        });
    }
    Ok(())
}

pub fn get_takedown(conn: &Connection, id: &str) -> WardenResult<Option<TakedownRequest>> {
    let row = conn
        .query_row(
            &format!("SELECT {TAKEDOWN_COLUMNS} FROM takedown_requests WHERE id = ?1"),
            params![id],
            TakedownRow::from_row,
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    row.map(TakedownRow::into_request).transpose()
}

pub fn active_for_case(conn: &Connection, case_id: &str) -> WardenResult<Option<TakedownRequest>> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {TAKEDOWN_COLUMNS} FROM takedown_requests
                 WHERE case_id = ?1 AND status IN ('pending', 'sent', 'acknowledged')"
            ),
            params![case_id],
            TakedownRow::from_row,
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    row.map(TakedownRow::into_request).transpose()
}

/// Delivered, unanswered requests whose deadline lies before `now`.
pub fn past_deadline(conn: &Connection, now: DateTime<Utc>) -> WardenResult<Vec<TakedownRequest>> {
    collect(
        conn,
        &format!(
            "SELECT {TAKEDOWN_COLUMNS} FROM takedown_requests
             WHERE status IN ('sent', 'acknowledged') AND compliance_deadline < ?1
             ORDER BY compliance_deadline ASC"
        ),
        params![fmt_ts(now)],
    )
}

pub fn pending(conn: &Connection) -> WardenResult<Vec<TakedownRequest>> {
    collect(
        conn,
        &format!(
            "SELECT {TAKEDOWN_COLUMNS} FROM takedown_requests
             WHERE status = 'pending' ORDER BY created_at ASC"
        ),
        [],
    )
}

fn collect<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> WardenResult<Vec<TakedownRequest>> {
    let mut stmt = conn.prepare(sql).map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params, TakedownRow::from_row)
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.map(|row| {
        row.map_err(|e| to_storage_err(e.to_string()))?
            .into_request()
    })
    .collect()
}

fn active_exists(active: &TakedownRequest) -> WardenError {
    TransitionError::ActiveTakedownExists {
        case_id: active.case_id.clone(),
        request_id: active.id.clone(),
        status: active.status,
    }
    .into()
}
