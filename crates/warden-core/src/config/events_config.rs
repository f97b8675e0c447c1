use serde::{Deserialize, Serialize};

use super::defaults;

/// What happens when a subscriber's queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Skip the event for this subscriber and mark it lagged; it catches up by replay.
    #[default]
    DropNewest,
    /// Close the subscription; the consumer must resubscribe and replay.
    Disconnect,
}

/// Event publisher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub subscriber_queue_capacity: usize,
    pub overflow_policy: OverflowPolicy,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            subscriber_queue_capacity: defaults::DEFAULT_SUBSCRIBER_QUEUE_CAPACITY,
            overflow_policy: OverflowPolicy::DropNewest,
        }
    }
}
