//! # warden-events
//!
//! Case events are appended to the durable log first, then fanned out to
//! subscribers through bounded per-subscriber queues. Ordering holds per case;
//! a slow subscriber only ever affects itself.
//!
//! ```text
//! publish(case, type, payload)
//!     │
//!     ├─► IEventLog::append_event (sequence = last + 1)
//!     │
//!     └─► per-subscriber mpsc (bounded, overflow policy per subscriber)
//! ```

pub mod dedup;
pub mod publisher;
pub mod subscriber;

pub use dedup::Deduplicator;
pub use publisher::EventPublisher;
pub use subscriber::{Subscription, SubscriptionFilter};
