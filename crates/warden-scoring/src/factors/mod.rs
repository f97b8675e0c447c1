//! Individual scoring factors. Each returns a value in [0.0, 1.0].

pub mod confidence;
pub mod impact;
pub mod importance;
pub mod reach;
pub mod recency;

use chrono::{DateTime, Utc};

use warden_core::config::ScoringConfig;

/// Inputs shared by every factor besides the case itself.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    pub now: DateTime<Utc>,
    /// View count at which reach saturates.
    pub reach_cap_views: u64,
    /// Hours over which recency falls to zero.
    pub recency_window_hours: f64,
}

impl ScoringContext {
    pub fn from_config(config: &ScoringConfig, now: DateTime<Utc>) -> Self {
        Self {
            now,
            reach_cap_views: config.reach_cap_views,
            recency_window_hours: config.recency_window_hours,
        }
    }
}

impl Default for ScoringContext {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default(), Utc::now())
    }
}
