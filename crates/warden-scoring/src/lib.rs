//! # warden-scoring
//!
//! Priority scorer: five weighted factors folded into a 0-100 rank and a
//! priority class. Pure functions of the case, the weights, and `now`.

pub mod engine;
pub mod factors;
pub mod formula;
pub mod queue;

pub use engine::ScoringEngine;
pub use factors::ScoringContext;
pub use formula::ScoreBreakdown;
