//! # warden-batch
//!
//! Runs one action over many cases. Items are scheduled in submission order
//! behind a semaphore; each item records its own outcome, so one failure
//! never affects the others. Cancellation stops scheduling and lets started
//! items finish; items never scheduled end up `not_attempted`.

pub mod cancellation;
pub mod executor;
pub mod handle;
pub mod orchestrator;

pub use cancellation::{Cancellable, CancellationToken};
pub use executor::IItemExecutor;
pub use handle::BatchHandle;
pub use orchestrator::BatchOrchestrator;
