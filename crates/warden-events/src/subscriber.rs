use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use warden_core::models::CaseEvent;

/// Which events a subscription receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionFilter {
    All,
    Case(String),
}

impl SubscriptionFilter {
    pub fn matches(&self, event: &CaseEvent) -> bool {
        match self {
            SubscriptionFilter::All => true,
            SubscriptionFilter::Case(id) => *id == event.case_id,
        }
    }
}

/// Receiving half of a subscription.
///
/// When the queue overflowed under the drop-newest policy the subscription is
/// marked lagged; the consumer should replay from the log for the cases it
/// tracks and then clear the flag.
pub struct Subscription {
    id: u64,
    filter: SubscriptionFilter,
    rx: mpsc::Receiver<CaseEvent>,
    lagged: Arc<AtomicBool>,
}

impl Subscription {
    pub(crate) fn new(
        id: u64,
        filter: SubscriptionFilter,
        rx: mpsc::Receiver<CaseEvent>,
        lagged: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id,
            filter,
            rx,
            lagged,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn filter(&self) -> &SubscriptionFilter {
        &self.filter
    }

    /// Next event, or `None` once the publisher has disconnected this subscriber.
    pub async fn recv(&mut self) -> Option<CaseEvent> {
        self.rx.recv().await
    }

    /// Next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<CaseEvent> {
        self.rx.try_recv().ok()
    }

    /// Drain everything currently queued.
    pub fn drain(&mut self) -> Vec<CaseEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn is_lagged(&self) -> bool {
        self.lagged.load(Ordering::Acquire)
    }

    /// Reset the lagged flag, returning its previous value.
    pub fn clear_lagged(&self) -> bool {
        self.lagged.swap(false, Ordering::AcqRel)
    }
}
