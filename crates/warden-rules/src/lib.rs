//! # warden-rules
//!
//! Maps a scored case and an immutable policy version to an automated
//! action, and owns the history of published policy versions.

pub mod engine;
pub mod policy;

pub use engine::{resolve_thresholds, AppliedThresholds, RuleEngine};
pub use policy::{validate_policy, PolicyRegistry};
