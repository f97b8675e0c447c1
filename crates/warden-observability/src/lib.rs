//! # warden-observability
//!
//! Subscriber installation, span macros per engine operation, and the
//! [`EngineMetrics`] counter set.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use tracing_setup::init_tracing;
