use crate::errors::WardenResult;
use crate::models::CaseEvent;

/// Durable, append-only per-case event log.
pub trait IEventLog: Send + Sync {
    fn append_event(&self, event: &CaseEvent) -> WardenResult<()>;
    /// Events of a case with `sequence > after`, oldest first.
    fn events_since(&self, case_id: &str, after: u64) -> WardenResult<Vec<CaseEvent>>;
    /// Highest sequence recorded for a case, 0 if none.
    fn last_sequence(&self, case_id: &str) -> WardenResult<u64>;
}
