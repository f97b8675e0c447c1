//! JSON payloads of lifecycle events.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use warden_core::models::{Actor, CaseStatus, TakedownRequest, Trigger};

pub fn status_changed(from: CaseStatus, to: CaseStatus, trigger: Trigger, actor: &Actor) -> Value {
    json!({
        "from": from,
        "to": to,
        "trigger": trigger,
        "actor": actor,
    })
}

pub fn takedown_created(request: &TakedownRequest) -> Value {
    json!({
        "request_id": request.id,
        "platform": request.platform,
        "idempotency_key": request.idempotency_key,
        "policy_version": request.policy_version,
    })
}

pub fn dispatch_failed(request: &TakedownRequest, error: &str, will_retry: bool) -> Value {
    json!({
        "request_id": request.id,
        "attempt": request.retry_count,
        "error": error,
        "will_retry": will_retry,
    })
}

pub fn takedown_delivered(request: &TakedownRequest, reference: &str, window_days: u32) -> Value {
    json!({
        "request_id": request.id,
        "reference": reference,
        "sent_at": request.sent_at,
        "compliance_deadline": request.compliance_deadline,
        "window_days": window_days,
    })
}

pub fn takedown_acknowledged(request: &TakedownRequest, at: DateTime<Utc>) -> Value {
    json!({
        "request_id": request.id,
        "acknowledged_at": at,
    })
}

pub fn takedown_resolved(request: &TakedownRequest, reason: Option<&str>) -> Value {
    json!({
        "request_id": request.id,
        "outcome": request.status,
        "reason": reason,
    })
}
