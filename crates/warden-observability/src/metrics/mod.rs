//! Engine counters.
//!
//! [`EngineMetrics`] is shared by every engine behind an `Arc` and updated
//! with relaxed atomics; [`MetricsSnapshot`] is the serializable view.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use warden_core::models::Action;

#[derive(Debug, Default)]
pub struct EngineMetrics {
    cases_ingested: AtomicU64,
    decisions_auto_approve: AtomicU64,
    decisions_auto_reject: AtomicU64,
    decisions_manual_review: AtomicU64,
    transitions: AtomicU64,
    transition_conflicts: AtomicU64,
    dispatch_attempts: AtomicU64,
    dispatch_failures: AtomicU64,
    takedowns_delivered: AtomicU64,
    takedowns_expired: AtomicU64,
    batch_items_succeeded: AtomicU64,
    batch_items_failed: AtomicU64,
    events_published: AtomicU64,
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub cases_ingested: u64,
    pub decisions_auto_approve: u64,
    pub decisions_auto_reject: u64,
    pub decisions_manual_review: u64,
    pub transitions: u64,
    pub transition_conflicts: u64,
    pub dispatch_attempts: u64,
    pub dispatch_failures: u64,
    pub takedowns_delivered: u64,
    pub takedowns_expired: u64,
    pub batch_items_succeeded: u64,
    pub batch_items_failed: u64,
    pub events_published: u64,
    /// Subscriber deliveries skipped on queue overflow.
    pub events_dropped: u64,
}

impl MetricsSnapshot {
    pub fn decisions(&self) -> u64 {
        self.decisions_auto_approve + self.decisions_auto_reject + self.decisions_manual_review
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_ingest(&self) {
        bump(&self.cases_ingested);
    }

    pub fn record_decision(&self, action: Action) {
        match action {
            Action::AutoApprove => bump(&self.decisions_auto_approve),
            Action::AutoReject => bump(&self.decisions_auto_reject),
            Action::ManualReview => bump(&self.decisions_manual_review),
        }
    }

    pub fn record_transition(&self) {
        bump(&self.transitions);
    }

    pub fn record_conflict(&self) {
        bump(&self.transition_conflicts);
    }

    pub fn record_dispatch_attempt(&self) {
        bump(&self.dispatch_attempts);
    }

    pub fn record_dispatch_failure(&self) {
        bump(&self.dispatch_failures);
    }

    pub fn record_delivery(&self) {
        bump(&self.takedowns_delivered);
    }

    pub fn record_expiry(&self) {
        bump(&self.takedowns_expired);
    }

    pub fn record_batch_item(&self, succeeded: bool) {
        if succeeded {
            bump(&self.batch_items_succeeded);
        } else {
            bump(&self.batch_items_failed);
        }
    }

    pub fn record_event(&self) {
        bump(&self.events_published);
    }

    /// Copy every counter. `events_dropped` is owned by the publisher and
    /// left at zero here.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            cases_ingested: load(&self.cases_ingested),
            decisions_auto_approve: load(&self.decisions_auto_approve),
            decisions_auto_reject: load(&self.decisions_auto_reject),
            decisions_manual_review: load(&self.decisions_manual_review),
            transitions: load(&self.transitions),
            transition_conflicts: load(&self.transition_conflicts),
            dispatch_attempts: load(&self.dispatch_attempts),
            dispatch_failures: load(&self.dispatch_failures),
            takedowns_delivered: load(&self.takedowns_delivered),
            takedowns_expired: load(&self.takedowns_expired),
            batch_items_succeeded: load(&self.batch_items_succeeded),
            batch_items_failed: load(&self.batch_items_failed),
            events_published: load(&self.events_published),
            events_dropped: 0,
        }
    }
}
