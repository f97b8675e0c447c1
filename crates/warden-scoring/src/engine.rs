use chrono::{DateTime, Utc};
use tracing::debug;

use warden_core::config::{ScoringConfig, ScoringWeights};
use warden_core::errors::WardenResult;
use warden_core::models::{Case, PriorityClass};

use crate::factors::ScoringContext;
use crate::formula::{self, ScoreBreakdown};
use crate::queue;

/// Priority scorer holding validated weights and factor tuning.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    /// Build from config, rejecting weights that do not sum to 1.0.
    pub fn new(config: ScoringConfig) -> WardenResult<Self> {
        config.weights.validate()?;
        Ok(Self { config })
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.config.weights
    }

    /// Class and rank of a case at `now`.
    pub fn score(&self, case: &Case, now: DateTime<Utc>) -> (PriorityClass, f64) {
        let ctx = self.context(now);
        let rank = formula::compute(case, &self.config.weights, &ctx);
        let class = PriorityClass::from_rank(rank);
        debug!(case_id = %case.id, rank, priority = %class, "scored case");
        (class, rank)
    }

    /// Every factor and its contribution, for explaining a rank.
    pub fn score_breakdown(&self, case: &Case, now: DateTime<Utc>) -> ScoreBreakdown {
        formula::compute_breakdown(case, &self.config.weights, &self.context(now))
    }

    /// Score a case in place.
    pub fn apply(&self, case: &mut Case, now: DateTime<Utc>) {
        let (priority, rank) = self.score(case, now);
        case.priority = priority;
        case.priority_rank = rank;
    }

    /// Re-score and order a review queue, highest rank first.
    pub fn rank_queue(&self, cases: Vec<Case>, now: DateTime<Utc>) -> Vec<Case> {
        queue::rank_queue(cases, &self.config.weights, &self.context(now))
    }

    fn context(&self, now: DateTime<Utc>) -> ScoringContext {
        ScoringContext::from_config(&self.config, now)
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self {
            config: ScoringConfig::default(),
        }
    }
}
