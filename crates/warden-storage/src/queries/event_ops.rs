//! Append-only case event log.

use rusqlite::{params, Connection};

use warden_core::errors::WardenResult;
use warden_core::models::{CaseEvent, EventType};

use crate::{corrupt, fmt_ts, parse_ts, to_storage_err};

pub fn append_event(conn: &Connection, event: &CaseEvent) -> WardenResult<()> {
    let payload = serde_json::to_string(&event.payload)?;
    conn.execute(
        "INSERT INTO case_events (case_id, sequence, event_type, payload, emitted_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            event.case_id,
            event.sequence as i64,
            event.event_type.as_str(),
            payload,
            fmt_ts(event.emitted_at),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn events_since(conn: &Connection, case_id: &str, after: u64) -> WardenResult<Vec<CaseEvent>> {
    let mut stmt = conn
        .prepare(
            "SELECT case_id, sequence, event_type, payload, emitted_at FROM case_events
             WHERE case_id = ?1 AND sequence > ?2 ORDER BY sequence ASC",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![case_id, after as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut events = Vec::new();
    for row in rows {
        let (case_id, sequence, event_type, payload, emitted_at) =
            row.map_err(|e| to_storage_err(e.to_string()))?;
        let key = format!("{case_id}#{sequence}");
        events.push(CaseEvent {
            event_type: EventType::parse(&event_type)
                .ok_or_else(|| corrupt(&key, format!("unknown event type {event_type}")))?,
            payload: serde_json::from_str(&payload).map_err(|e| corrupt(&key, e))?,
            emitted_at: parse_ts(&key, &emitted_at)?,
            sequence: sequence as u64,
            case_id,
        });
    }
    Ok(events)
}

pub fn last_sequence(conn: &Connection, case_id: &str) -> WardenResult<u64> {
    let max: Option<i64> = conn
        .query_row(
            "SELECT MAX(sequence) FROM case_events WHERE case_id = ?1",
            params![case_id],
            |row| row.get(0),
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(max.unwrap_or(0) as u64)
}
