use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Kinds of case events streamed to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    CaseIngested,
    ActionDecided,
    StatusChanged,
    TakedownCreated,
    DispatchFailed,
    TakedownDelivered,
    TakedownAcknowledged,
    TakedownResolved,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::CaseIngested => "case_ingested",
            EventType::ActionDecided => "action_decided",
            EventType::StatusChanged => "status_changed",
            EventType::TakedownCreated => "takedown_created",
            EventType::DispatchFailed => "dispatch_failed",
            EventType::TakedownDelivered => "takedown_delivered",
            EventType::TakedownAcknowledged => "takedown_acknowledged",
            EventType::TakedownResolved => "takedown_resolved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "case_ingested" => EventType::CaseIngested,
            "action_decided" => EventType::ActionDecided,
            "status_changed" => EventType::StatusChanged,
            "takedown_created" => EventType::TakedownCreated,
            "dispatch_failed" => EventType::DispatchFailed,
            "takedown_delivered" => EventType::TakedownDelivered,
            "takedown_acknowledged" => EventType::TakedownAcknowledged,
            "takedown_resolved" => EventType::TakedownResolved,
            _ => return None,
        })
    }
}

/// A published state change. `sequence` increases by one per case, starting at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CaseEvent {
    pub case_id: String,
    pub sequence: u64,
    pub event_type: EventType,
    pub payload: serde_json::Value,
    pub emitted_at: DateTime<Utc>,
}
