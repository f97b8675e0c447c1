//! # warden-lifecycle
//!
//! The takedown lifecycle: a pure transition table, per-case async locks,
//! dispatch with bounded exponential backoff, compliance signal handling,
//! and the deadline sweep.
//!
//! ```text
//! detected ──approve──► verified ──dispatch──► takedown_sent ──┬─► removed
//!    │                     │                                    ├─► rejected
//!    └──────┬──────────────┘                                    └─► expired
//!           ▼
//!     false_positive
//! ```

pub mod engine;
pub mod locks;
pub mod payloads;
pub mod retry;
pub mod state_machine;

pub use engine::{LifecycleEngine, ResumeReport, SweepReport};
pub use locks::CaseLocks;
pub use retry::BackoffPolicy;
