//! Cooperative cancellation for batch jobs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Something that can be asked to stop.
pub trait Cancellable {
    fn is_cancelled(&self) -> bool;
    fn cancel(&self);
}

/// Shared flag checked by the batch driver before scheduling each item.
///
/// Clones share the flag, so the handle given to callers and the driver
/// task observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cancellable for CancellationToken {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}
