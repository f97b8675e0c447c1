//! Rule engine tests: threshold boundaries, overrides, golden datasets, and determinism.

use proptest::prelude::*;

use test_fixtures::{load_decision_sets, make_case, make_case_on, make_policy_version};
use warden_core::models::*;
use warden_rules::{resolve_thresholds, RuleEngine};

fn default_version() -> PolicyVersion {
    make_policy_version(1, AutomationPolicy::default())
}

// ── Boundaries ─────────────────────────────────────────────────────────────

#[test]
fn approve_threshold_boundary() {
    let engine = RuleEngine::new();
    let policy = default_version();
    let at = engine.decide(&make_case("a", 85.0, PriorityClass::High), &policy);
    let above = engine.decide(&make_case("b", 86.0, PriorityClass::High), &policy);
    let below = engine.decide(&make_case("c", 84.0, PriorityClass::High), &policy);
    assert_eq!(at.action, Action::AutoApprove);
    assert_eq!(above.action, Action::AutoApprove);
    assert_eq!(below.action, Action::ManualReview);
}

#[test]
fn reject_threshold_boundary() {
    let engine = RuleEngine::new();
    let policy = default_version();
    let at = engine.decide(&make_case("a", 20.0, PriorityClass::Medium), &policy);
    let below = engine.decide(&make_case("b", 19.0, PriorityClass::Medium), &policy);
    let above = engine.decide(&make_case("c", 21.0, PriorityClass::Medium), &policy);
    assert_eq!(at.action, Action::AutoReject);
    assert_eq!(below.action, Action::AutoReject);
    assert_eq!(above.action, Action::ManualReview);
}

#[test]
fn low_priority_is_never_auto_approved() {
    let decision = RuleEngine::new().decide(&make_case("a", 99.0, PriorityClass::Low), &default_version());
    assert_eq!(decision.action, Action::ManualReview);
    assert!(decision.reason.contains("low priority"));
}

#[test]
fn middle_confidence_goes_to_review() {
    let decision =
        RuleEngine::new().decide(&make_case("a", 40.0, PriorityClass::Critical), &default_version());
    assert_eq!(decision.action, Action::ManualReview);
    assert_eq!(decision.approve_threshold, 85.0);
    assert_eq!(decision.reject_threshold, 20.0);
    assert_eq!(decision.threshold_source, ThresholdSource::Global);
}

#[test]
fn decision_records_policy_version_and_priority() {
    let case = make_case("a", 90.0, PriorityClass::Critical);
    let decision = RuleEngine::new().decide(&case, &make_policy_version(7, AutomationPolicy::default()));
    assert_eq!(decision.policy_version, 7);
    assert_eq!(decision.case_id, "a");
    assert_eq!(decision.priority, PriorityClass::Critical);
    assert_eq!(decision.priority_rank, case.priority_rank);
}

#[test]
fn decide_does_not_touch_the_case() {
    let case = make_case("a", 95.0, PriorityClass::High);
    let before = (case.status, case.version);
    let _ = RuleEngine::new().decide(&case, &default_version());
    assert_eq!((case.status, case.version), before);
}

// ── Overrides ──────────────────────────────────────────────────────────────

#[test]
fn override_replaces_thresholds_field_by_field() {
    let mut policy = AutomationPolicy::default();
    policy.platform_overrides.insert(
        "tiktok".to_string(),
        PlatformOverride {
            auto_approve_threshold: Some(70.0),
            ..Default::default()
        },
    );
    let applied = resolve_thresholds(&policy, " TikTok ");
    assert_eq!(applied.approve, 70.0);
    assert_eq!(applied.reject, 20.0);
    assert_eq!(applied.source, ThresholdSource::PlatformOverride);
}

#[test]
fn window_only_override_keeps_global_thresholds() {
    let mut policy = AutomationPolicy::default();
    policy.platform_overrides.insert(
        "tiktok".to_string(),
        PlatformOverride {
            compliance_window_days: Some(3),
            ..Default::default()
        },
    );
    let decision = RuleEngine::new().decide(
        &make_case_on("a", "tiktok", 90.0, PriorityClass::High),
        &make_policy_version(1, policy),
    );
    assert_eq!(decision.threshold_source, ThresholdSource::Global);
    assert_eq!(decision.action, Action::AutoApprove);
}

// ── Golden datasets ────────────────────────────────────────────────────────

#[test]
fn golden_decisions_match() {
    let engine = RuleEngine::new();
    let sets = load_decision_sets();
    assert!(!sets.is_empty(), "no golden decision sets found");
    for set in sets {
        for golden in set.cases {
            let policy = make_policy_version(1, golden.policy.clone().normalized());
            let case = make_case_on(&golden.name, &golden.platform, golden.confidence, golden.priority);
            let decision = engine.decide(&case, &policy);
            assert_eq!(
                decision.action, golden.expected_action,
                "{} / {}: {}",
                set.description, golden.name, decision.reason
            );
            assert_eq!(
                decision.threshold_source, golden.expected_source,
                "{} / {}",
                set.description, golden.name
            );
        }
    }
}

// ── Properties ─────────────────────────────────────────────────────────────

fn arb_priority() -> impl Strategy<Value = PriorityClass> {
    prop_oneof![
        Just(PriorityClass::Low),
        Just(PriorityClass::Medium),
        Just(PriorityClass::High),
        Just(PriorityClass::Critical),
    ]
}

proptest! {
    #[test]
    fn decide_is_idempotent(confidence in 0.0f64..=100.0, priority in arb_priority()) {
        let engine = RuleEngine::new();
        let case = make_case("p", confidence, priority);
        let policy = default_version();
        prop_assert_eq!(engine.decide(&case, &policy), engine.decide(&case, &policy));
    }

    #[test]
    fn decision_follows_threshold_rules(
        confidence in 0.0f64..=100.0,
        priority in arb_priority(),
        reject in 0.0f64..50.0,
        gap in 1.0f64..50.0,
    ) {
        let policy = AutomationPolicy {
            auto_reject_threshold: reject,
            auto_approve_threshold: reject + gap,
            ..Default::default()
        };
        let decision = RuleEngine::new().decide(
            &make_case("p", confidence, priority),
            &make_policy_version(1, policy),
        );
        let expected = if confidence >= reject + gap && priority != PriorityClass::Low {
            Action::AutoApprove
        } else if confidence <= reject {
            Action::AutoReject
        } else {
            Action::ManualReview
        };
        prop_assert_eq!(decision.action, expected);
    }
}
