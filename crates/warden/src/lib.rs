//! # warden
//!
//! [`TriageEngine`] owns every component over one store:
//!
//! ```text
//! intake ─► ScoringEngine ─► RuleEngine ─┬─ AutoApprove ─► LifecycleEngine ─► INoticeDispatcher
//!                                        ├─ AutoReject ──► LifecycleEngine
//!                                        └─ ManualReview   (waits for a reviewer)
//!
//! BatchOrchestrator ─► PipelineExecutor ─► same entry points as above
//! every transition ──► EventPublisher ─► subscribers
//! ```

pub mod engine;
pub mod executor;
pub mod pipeline;
pub mod scheduler;

pub use engine::TriageEngine;
pub use executor::PipelineExecutor;
pub use pipeline::{ApprovalOutcome, IngestOutcome, Preview, TriagePipeline};

pub use warden_batch::{BatchHandle, Cancellable, CancellationToken};
pub use warden_core::{WardenConfig, WardenError, WardenResult};
pub use warden_events::{Subscription, SubscriptionFilter};
pub use warden_lifecycle::{ResumeReport, SweepReport};
pub use warden_observability::{init_tracing, MetricsSnapshot};
