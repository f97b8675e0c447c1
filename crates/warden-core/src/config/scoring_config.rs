use serde::{Deserialize, Serialize};

use super::defaults;
use crate::constants::WEIGHT_SUM_TOLERANCE;
use crate::errors::{WardenError, WardenResult};

/// Share of the 0-100 rank contributed by each factor. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub confidence: f64,
    pub impact: f64,
    pub reach: f64,
    pub recency: f64,
    pub importance: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            confidence: defaults::DEFAULT_CONFIDENCE_WEIGHT,
            impact: defaults::DEFAULT_IMPACT_WEIGHT,
            reach: defaults::DEFAULT_REACH_WEIGHT,
            recency: defaults::DEFAULT_RECENCY_WEIGHT,
            importance: defaults::DEFAULT_IMPORTANCE_WEIGHT,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.confidence + self.impact + self.reach + self.recency + self.importance
    }

    pub fn validate(&self) -> WardenResult<()> {
        let all = [
            self.confidence,
            self.impact,
            self.reach,
            self.recency,
            self.importance,
        ];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(WardenError::ConfigError(
                "scoring weights must be finite and non-negative".to_string(),
            ));
        }
        if (self.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(WardenError::ConfigError(format!(
                "scoring weights must sum to 1.0, got {}",
                self.sum()
            )));
        }
        Ok(())
    }
}

/// Scorer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    /// View count at which the reach factor saturates.
    pub reach_cap_views: u64,
    /// Hours over which the recency factor decays to zero.
    pub recency_window_hours: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            reach_cap_views: defaults::DEFAULT_REACH_CAP_VIEWS,
            recency_window_hours: defaults::DEFAULT_RECENCY_WINDOW_HOURS,
        }
    }
}
