//! Published automation policy versions.

use rusqlite::{params, Connection, OptionalExtension};

use warden_core::errors::WardenResult;
use warden_core::models::{AutomationPolicy, PolicyVersion};

use crate::{corrupt, fmt_ts, parse_ts, to_storage_err};

/// Versions are immutable; re-inserting an existing version is an error.
pub fn insert_policy_version(conn: &Connection, version: &PolicyVersion) -> WardenResult<()> {
    let policy = serde_json::to_string(&version.policy)?;
    conn.execute(
        "INSERT INTO policy_versions (version, policy, created_at) VALUES (?1, ?2, ?3)",
        params![version.version as i64, policy, fmt_ts(version.created_at)],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn get_policy_version(conn: &Connection, version: u64) -> WardenResult<Option<PolicyVersion>> {
    select_one(
        conn,
        "SELECT version, policy, created_at FROM policy_versions WHERE version = ?1",
        params![version as i64],
    )
}

pub fn latest_policy_version(conn: &Connection) -> WardenResult<Option<PolicyVersion>> {
    select_one(
        conn,
        "SELECT version, policy, created_at FROM policy_versions ORDER BY version DESC LIMIT 1",
        [],
    )
}

fn select_one<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> WardenResult<Option<PolicyVersion>> {
    let raw: Option<(i64, String, String)> = conn
        .query_row(sql, params, |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    let Some((version, policy, created_at)) = raw else {
        return Ok(None);
    };
    let key = format!("policy:{version}");
    let policy: AutomationPolicy = serde_json::from_str(&policy).map_err(|e| corrupt(&key, e))?;
    Ok(Some(PolicyVersion {
        version: version as u64,
        policy,
        created_at: parse_ts(&key, &created_at)?,
    }))
}
