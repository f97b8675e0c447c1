//! Parallel ranking of review queues.

use std::cmp::Ordering;

use rayon::prelude::*;

use warden_core::config::ScoringWeights;
use warden_core::models::{Case, PriorityClass};

use crate::factors::ScoringContext;
use crate::formula;

/// Score every case in parallel, then sort by rank descending.
/// Equal ranks put the older detection first; remaining ties keep input order.
pub fn rank_queue(mut cases: Vec<Case>, weights: &ScoringWeights, ctx: &ScoringContext) -> Vec<Case> {
    cases.par_iter_mut().for_each(|case| {
        let rank = formula::compute(case, weights, ctx);
        case.priority_rank = rank;
        case.priority = PriorityClass::from_rank(rank);
    });
    cases.par_sort_by(queue_order);
    cases
}

/// Queue ordering over already-scored cases.
pub fn queue_order(a: &Case, b: &Case) -> Ordering {
    b.priority_rank
        .total_cmp(&a.priority_rank)
        .then_with(|| a.detected_at.cmp(&b.detected_at))
}
