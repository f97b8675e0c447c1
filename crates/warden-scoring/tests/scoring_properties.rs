//! Property tests for the scorer.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use warden_core::models::*;
use warden_scoring::ScoringEngine;

fn make_case(
    confidence: f64,
    impact: EstimatedImpact,
    reach: u64,
    importance: u8,
    age_hours: i64,
) -> (Case, chrono::DateTime<Utc>) {
    let detected = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let case = Case {
        id: "prop".to_string(),
        profile_id: "p".to_string(),
        url: "https://example.com".to_string(),
        platform: "web".to_string(),
        content_type: ContentType::Text,
        confidence,
        similarity: confidence,
        priority: PriorityClass::Low,
        priority_rank: 0.0,
        status: CaseStatus::Detected,
        signals: CaseSignals {
            estimated_impact: impact,
            platform_reach: reach,
            profile_importance: importance,
        },
        jurisdiction: None,
        detected_at: detected,
        updated_at: detected,
        takedown_request_id: None,
        version: 0,
        decided_policy_version: None,
    };
    (case, detected + Duration::hours(age_hours))
}

fn arb_impact() -> impl Strategy<Value = EstimatedImpact> {
    prop_oneof![
        Just(EstimatedImpact::Low),
        Just(EstimatedImpact::Medium),
        Just(EstimatedImpact::High),
    ]
}

proptest! {
    #[test]
    fn rank_is_bounded(
        confidence in -50.0f64..200.0,
        impact in arb_impact(),
        reach in any::<u64>(),
        importance in any::<u8>(),
        age in -100i64..1000,
    ) {
        let engine = ScoringEngine::default();
        let (case, now) = make_case(confidence, impact, reach, importance, age);
        let (class, rank) = engine.score(&case, now);
        prop_assert!((0.0..=100.0).contains(&rank));
        prop_assert_eq!(class, PriorityClass::from_rank(rank));
    }

    #[test]
    fn rank_is_monotonic_in_confidence(
        a in 0.0f64..100.0,
        b in 0.0f64..100.0,
        impact in arb_impact(),
        reach in 0u64..10_000_000,
        importance in 1u8..=10,
        age in 0i64..48,
    ) {
        let engine = ScoringEngine::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let (case_lo, now) = make_case(lo, impact, reach, importance, age);
        let (case_hi, _) = make_case(hi, impact, reach, importance, age);
        prop_assert!(engine.score(&case_lo, now).1 <= engine.score(&case_hi, now).1);
    }

    #[test]
    fn rank_never_increases_with_age(
        confidence in 0.0f64..100.0,
        age in 0i64..48,
        extra in 0i64..48,
    ) {
        let engine = ScoringEngine::default();
        let (case, now) = make_case(confidence, EstimatedImpact::Medium, 1_000, 5, age);
        let later = now + Duration::hours(extra);
        prop_assert!(engine.score(&case, later).1 <= engine.score(&case, now).1);
    }

    #[test]
    fn scoring_is_deterministic(confidence in 0.0f64..100.0, reach in any::<u64>()) {
        let engine = ScoringEngine::default();
        let (case, now) = make_case(confidence, EstimatedImpact::High, reach, 3, 2);
        prop_assert_eq!(engine.score(&case, now), engine.score(&case, now));
    }
}
