//! Consumer-side de-duplication by per-case sequence number.

use std::collections::HashMap;

use warden_core::models::CaseEvent;

/// Tracks the highest sequence seen per case.
///
/// Delivery is at-least-once: replay after a lag can resend events a
/// consumer already processed. `accept` filters those out.
#[derive(Debug, Default)]
pub struct Deduplicator {
    last_seen: HashMap<String, u64>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the event is new for its case. Accepting advances the watermark.
    pub fn accept(&mut self, event: &CaseEvent) -> bool {
        let seen = self.last_seen.entry(event.case_id.clone()).or_insert(0);
        if event.sequence <= *seen {
            return false;
        }
        *seen = event.sequence;
        true
    }

    /// Filter a batch, keeping only unseen events in their original order.
    pub fn filter(&mut self, events: Vec<CaseEvent>) -> Vec<CaseEvent> {
        events.into_iter().filter(|e| self.accept(e)).collect()
    }

    /// Highest sequence accepted for a case, 0 if none.
    pub fn last_seen(&self, case_id: &str) -> u64 {
        self.last_seen.get(case_id).copied().unwrap_or(0)
    }
}
