use serde::Serialize;

use warden_core::config::ScoringWeights;
use warden_core::constants::{RANK_MAX, SCORE_MIN};
use warden_core::models::{Case, PriorityClass};

use crate::factors::{self, ScoringContext};

/// Weighted additive priority formula.
///
/// ```text
/// rank = 100 × ( w_confidence × confidence
///              + w_impact     × impact
///              + w_reach      × reach
///              + w_recency    × recency
///              + w_importance × importance )
/// ```
///
/// Every factor lies in [0, 1]; the result is clamped to [0, 100].
pub fn compute(case: &Case, weights: &ScoringWeights, ctx: &ScoringContext) -> f64 {
    compute_breakdown(case, weights, ctx).rank
}

/// Raw factor values, their weighted contributions, and the resulting rank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub confidence: f64,
    pub impact: f64,
    pub reach: f64,
    pub recency: f64,
    pub importance: f64,
    /// Rank points contributed by each factor, in the order above.
    pub contributions: [f64; 5],
    pub rank: f64,
    pub priority: PriorityClass,
}

pub fn compute_breakdown(
    case: &Case,
    weights: &ScoringWeights,
    ctx: &ScoringContext,
) -> ScoreBreakdown {
    let confidence = factors::confidence::calculate(case.confidence);
    let impact = factors::impact::calculate(case.signals.estimated_impact);
    let reach = factors::reach::calculate(case.signals.platform_reach, ctx.reach_cap_views);
    let recency =
        factors::recency::calculate(case.detected_at, ctx.now, ctx.recency_window_hours);
    let importance = factors::importance::calculate(case.signals.profile_importance);

    let contributions = [
        weights.confidence * confidence * RANK_MAX,
        weights.impact * impact * RANK_MAX,
        weights.reach * reach * RANK_MAX,
        weights.recency * recency * RANK_MAX,
        weights.importance * importance * RANK_MAX,
    ];
    let rank = contributions.iter().sum::<f64>().clamp(SCORE_MIN, RANK_MAX);

    ScoreBreakdown {
        confidence,
        impact,
        reach,
        recency,
        importance,
        contributions,
        rank,
        priority: PriorityClass::from_rank(rank),
    }
}
