//! EventPublisher: durable append, then bounded fan-out.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use warden_core::config::{EventsConfig, OverflowPolicy};
use warden_core::errors::WardenResult;
use warden_core::models::{CaseEvent, EventType};
use warden_core::traits::IEventLog;

use crate::subscriber::{Subscription, SubscriptionFilter};

struct SubscriberSlot {
    filter: SubscriptionFilter,
    tx: mpsc::Sender<CaseEvent>,
    overflow: OverflowPolicy,
    lagged: Arc<AtomicBool>,
}

/// Publishes case events with per-case monotonic sequence numbers.
pub struct EventPublisher {
    log: Arc<dyn IEventLog>,
    /// Last sequence per open case. The entry is held across append and
    /// fan-out, which is what keeps events of one case in order for every
    /// subscriber. A missing entry is rebuilt from the log.
    sequences: DashMap<String, u64>,
    subscribers: DashMap<u64, SubscriberSlot>,
    next_subscriber_id: AtomicU64,
    config: EventsConfig,
    dropped: AtomicU64,
}

impl EventPublisher {
    pub fn new(log: Arc<dyn IEventLog>, config: EventsConfig) -> Self {
        Self {
            log,
            sequences: DashMap::new(),
            subscribers: DashMap::new(),
            next_subscriber_id: AtomicU64::new(1),
            config,
            dropped: AtomicU64::new(0),
        }
    }

    /// Append an event to the log and deliver it to matching subscribers.
    ///
    /// If the append fails nothing is delivered and the sequence is not consumed.
    pub fn publish(
        &self,
        case_id: &str,
        event_type: EventType,
        payload: serde_json::Value,
    ) -> WardenResult<CaseEvent> {
        let mut last = match self.sequences.entry(case_id.to_string()) {
            Entry::Occupied(entry) => entry.into_ref(),
            Entry::Vacant(entry) => {
                let resumed = self.log.last_sequence(case_id)?;
                entry.insert(resumed)
            }
        };

        let event = CaseEvent {
            case_id: case_id.to_string(),
            sequence: *last + 1,
            event_type,
            payload,
            emitted_at: Utc::now(),
        };
        self.log.append_event(&event)?;
        *last = event.sequence;

        self.fan_out(&event);
        drop(last);

        debug!(
            case_id,
            sequence = event.sequence,
            event_type = event.event_type.as_str(),
            "published case event"
        );
        Ok(event)
    }

    /// Drop the cached sequence of a case that has closed. A later event
    /// for it resumes from the log.
    pub fn forget(&self, case_id: &str) {
        self.sequences.remove(case_id);
    }

    /// Cases whose last sequence is cached.
    pub fn tracked_cases(&self) -> usize {
        self.sequences.len()
    }

    fn fan_out(&self, event: &CaseEvent) {
        let mut disconnect = Vec::new();
        for slot in self.subscribers.iter() {
            if !slot.filter.matches(event) {
                continue;
            }
            match slot.tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    match slot.overflow {
                        OverflowPolicy::DropNewest => {
                            if !slot.lagged.swap(true, Ordering::AcqRel) {
                                warn!(subscriber = *slot.key(), "subscriber lagging, dropping events");
                            }
                        }
                        OverflowPolicy::Disconnect => {
                            warn!(subscriber = *slot.key(), "subscriber queue full, disconnecting");
                            disconnect.push(*slot.key());
                        }
                    }
                }
                Err(TrySendError::Closed(_)) => disconnect.push(*slot.key()),
            }
        }
        for id in disconnect {
            self.subscribers.remove(&id);
        }
    }

    /// Subscribe with the configured queue capacity and overflow policy.
    pub fn subscribe(&self, filter: SubscriptionFilter) -> Subscription {
        self.subscribe_with(
            filter,
            self.config.subscriber_queue_capacity,
            self.config.overflow_policy,
        )
    }

    pub fn subscribe_with(
        &self,
        filter: SubscriptionFilter,
        capacity: usize,
        overflow: OverflowPolicy,
    ) -> Subscription {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        let lagged = Arc::new(AtomicBool::new(false));
        self.subscribers.insert(
            id,
            SubscriberSlot {
                filter: filter.clone(),
                tx,
                overflow,
                lagged: Arc::clone(&lagged),
            },
        );
        debug!(subscriber = id, ?filter, "subscriber registered");
        Subscription::new(id, filter, rx, lagged)
    }

    /// Remove a subscriber. Its receiver drains what is queued, then ends.
    pub fn unsubscribe(&self, id: u64) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    /// Durable events of a case after `after_sequence`, oldest first.
    pub fn replay(&self, case_id: &str, after_sequence: u64) -> WardenResult<Vec<CaseEvent>> {
        self.log.events_since(case_id, after_sequence)
    }

    /// Last sequence published for a case (from memory, else from the log).
    pub fn last_sequence(&self, case_id: &str) -> WardenResult<u64> {
        match self.sequences.get(case_id) {
            Some(seq) => Ok(*seq),
            None => self.log.last_sequence(case_id),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliveries skipped because a subscriber queue was full.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("subscribers", &self.subscribers.len())
            .field("cases", &self.sequences.len())
            .field("dropped", &self.dropped_events())
            .finish()
    }
}
