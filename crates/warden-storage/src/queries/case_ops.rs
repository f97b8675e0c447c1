//! Insert, update, get, query, and compare-and-swap for cases.

use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};

use warden_core::errors::{WardenError, WardenResult};
use warden_core::models::{Case, CaseFilter, CaseSignals};
use warden_core::traits::{CasOutcome, CaseTransition};

use crate::{corrupt, fmt_ts, parse_ts, to_storage_err};

const CASE_COLUMNS: &str = "id, profile_id, url, platform, content_type, confidence, similarity,
    priority, priority_rank, status, signals, jurisdiction, detected_at, updated_at,
    takedown_request_id, version, decided_policy_version";

/// Raw column values, converted to a [`Case`] outside the rusqlite closure.
struct CaseRow {
    id: String,
    profile_id: String,
    url: String,
    platform: String,
    content_type: String,
    confidence: f64,
    similarity: f64,
    priority: String,
    priority_rank: f64,
    status: String,
    signals: String,
    jurisdiction: Option<String>,
    detected_at: String,
    updated_at: String,
    takedown_request_id: Option<String>,
    version: i64,
    decided_policy_version: Option<i64>,
}

impl CaseRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            profile_id: row.get(1)?,
            url: row.get(2)?,
            platform: row.get(3)?,
            content_type: row.get(4)?,
            confidence: row.get(5)?,
            similarity: row.get(6)?,
            priority: row.get(7)?,
            priority_rank: row.get(8)?,
            status: row.get(9)?,
            signals: row.get(10)?,
            jurisdiction: row.get(11)?,
            detected_at: row.get(12)?,
            updated_at: row.get(13)?,
            takedown_request_id: row.get(14)?,
            version: row.get(15)?,
            decided_policy_version: row.get(16)?,
        })
    }

    fn into_case(self) -> WardenResult<Case> {
        let signals: CaseSignals =
            serde_json::from_str(&self.signals).map_err(|e| corrupt(&self.id, e))?;
        Ok(Case {
            content_type: self.content_type.parse().map_err(|e| corrupt(&self.id, e))?,
            priority: self.priority.parse().map_err(|e| corrupt(&self.id, e))?,
            status: self.status.parse().map_err(|e| corrupt(&self.id, e))?,
            detected_at: parse_ts(&self.id, &self.detected_at)?,
            updated_at: parse_ts(&self.id, &self.updated_at)?,
            version: self.version as u64,
            decided_policy_version: self.decided_policy_version.map(|v| v as u64),
            signals,
            id: self.id,
            profile_id: self.profile_id,
            url: self.url,
            platform: self.platform,
            confidence: self.confidence,
            similarity: self.similarity,
            priority_rank: self.priority_rank,
            jurisdiction: self.jurisdiction,
            takedown_request_id: self.takedown_request_id,
        })
    }
}

/// Insert a case, or refresh the derived fields of an existing one.
///
/// Scanner scores, status, and version are never overwritten here.
pub fn upsert_case(conn: &Connection, case: &Case) -> WardenResult<()> {
    write_case(
        conn,
        case,
        "ON CONFLICT(id) DO UPDATE SET
            priority = excluded.priority,
            priority_rank = excluded.priority_rank,
            signals = excluded.signals,
            jurisdiction = excluded.jurisdiction,
            updated_at = excluded.updated_at,
            decided_policy_version = COALESCE(excluded.decided_policy_version, cases.decided_policy_version)",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Insert a case that must not exist yet.
pub fn insert_case(conn: &Connection, case: &Case) -> WardenResult<()> {
    match write_case(conn, case, "") {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
            Err(WardenError::ValidationError(format!(
                "case {} was already ingested",
                case.id
            )))
        }
        Err(e) => Err(to_storage_err(e.to_string())),
    }
}

fn write_case(conn: &Connection, case: &Case, on_conflict: &str) -> rusqlite::Result<usize> {
    let signals = serde_json::to_string(&case.signals)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    conn.execute(
        &format!(
            "INSERT INTO cases ({CASE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
             {on_conflict}"
        ),
        params![
            case.id,
            case.profile_id,
            case.url,
            case.platform,
            case.content_type.as_str(),
            case.confidence,
            case.similarity,
            case.priority.as_str(),
            case.priority_rank,
            case.status.as_str(),
            signals,
            case.jurisdiction,
            fmt_ts(case.detected_at),
            fmt_ts(case.updated_at),
            case.takedown_request_id,
            case.version as i64,
            case.decided_policy_version.map(|v| v as i64),
        ],
    )
}

pub fn get_case(conn: &Connection, id: &str) -> WardenResult<Option<Case>> {
    let row = conn
        .query_row(
            &format!("SELECT {CASE_COLUMNS} FROM cases WHERE id = ?1"),
            params![id],
            CaseRow::from_row,
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    row.map(CaseRow::into_case).transpose()
}

/// Filtered query, highest rank first.
pub fn query_cases(conn: &Connection, filter: &CaseFilter) -> WardenResult<Vec<Case>> {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<String> = Vec::new();

    if !filter.statuses.is_empty() {
        let placeholders: Vec<String> = filter
            .statuses
            .iter()
            .map(|s| {
                values.push(s.as_str().to_string());
                format!("?{}", values.len())
            })
            .collect();
        clauses.push(format!("status IN ({})", placeholders.join(", ")));
    }
    if let Some(platform) = &filter.platform {
        values.push(platform.clone());
        clauses.push(format!("platform = ?{} COLLATE NOCASE", values.len()));
    }
    if let Some(profile_id) = &filter.profile_id {
        values.push(profile_id.clone());
        clauses.push(format!("profile_id = ?{}", values.len()));
    }

    let mut sql = format!("SELECT {CASE_COLUMNS} FROM cases");
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY priority_rank DESC, detected_at ASC");

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), CaseRow::from_row)
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut cases = Vec::new();
    for row in rows {
        let case = row.map_err(|e| to_storage_err(e.to_string()))?.into_case()?;
        // Priority is an ordered enum; filtering here keeps the SQL simple.
        if filter.min_priority.map_or(true, |min| case.priority >= min) {
            cases.push(case);
        }
        if filter.limit.is_some_and(|limit| cases.len() >= limit) {
            break;
        }
    }
    Ok(cases)
}

/// Apply a status transition only if status and version still match.
pub fn compare_and_swap_status(
    conn: &Connection,
    transition: &CaseTransition,
) -> WardenResult<CasOutcome> {
    swap_with(conn, transition, |_| Ok(()))
}

/// Like [`compare_and_swap_status`], running `on_swap` in the same
/// transaction once the swap lands. An error from `on_swap` rolls both back.
pub fn swap_with<F>(
    conn: &Connection,
    transition: &CaseTransition,
    on_swap: F,
) -> WardenResult<CasOutcome>
where
    F: FnOnce(&Connection) -> WardenResult<()>,
{
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("cas begin: {e}")))?;

    let updated = tx
        .execute(
            "UPDATE cases SET
                status = ?1,
                version = version + 1,
                updated_at = ?2,
                takedown_request_id = COALESCE(?3, takedown_request_id),
                decided_policy_version = COALESCE(?4, decided_policy_version)
             WHERE id = ?5 AND status = ?6 AND version = ?7",
            params![
                transition.next_status.as_str(),
                fmt_ts(transition.at),
                transition.takedown_request_id,
                transition.policy_version.map(|v| v as i64),
                transition.case_id,
                transition.expected_status.as_str(),
                transition.expected_version as i64,
            ],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    if updated == 1 {
        on_swap(&*tx)?;
    }

    let current = get_case(&tx, &transition.case_id)?.ok_or_else(|| WardenError::CaseNotFound {
        id: transition.case_id.clone(),
    })?;

    tx.commit()
        .map_err(|e| to_storage_err(format!("cas commit: {e}")))?;

    Ok(if updated == 1 {
        CasOutcome::Swapped(current)
    } else {
        CasOutcome::Conflict(current)
    })
}
