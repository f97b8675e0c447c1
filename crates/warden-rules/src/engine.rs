//! RuleEngine: pure `decide(case, policy_version) -> Decision`.

use tracing::debug;

use warden_core::models::{
    Action, AutomationPolicy, Case, Decision, PolicyVersion, PriorityClass, ThresholdSource,
};

/// Thresholds in effect for one platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedThresholds {
    pub approve: f64,
    pub reject: f64,
    pub source: ThresholdSource,
    pub force_manual_review: bool,
}

/// Resolve the thresholds for a platform. A platform override replaces the
/// global value field by field.
pub fn resolve_thresholds(policy: &AutomationPolicy, platform: &str) -> AppliedThresholds {
    let global = AppliedThresholds {
        approve: policy.auto_approve_threshold,
        reject: policy.auto_reject_threshold,
        source: ThresholdSource::Global,
        force_manual_review: false,
    };
    let Some(ov) = policy.override_for(platform) else {
        return global;
    };
    let touches_decision = ov.auto_approve_threshold.is_some()
        || ov.auto_reject_threshold.is_some()
        || ov.force_manual_review;
    if !touches_decision {
        return global;
    }
    AppliedThresholds {
        approve: ov.auto_approve_threshold.unwrap_or(global.approve),
        reject: ov.auto_reject_threshold.unwrap_or(global.reject),
        source: ThresholdSource::PlatformOverride,
        force_manual_review: ov.force_manual_review,
    }
}

/// Stateless decision engine. Never touches case status.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    /// Decide the automated action for a case under one policy version.
    ///
    /// Identical `(case, policy_version)` inputs always give identical decisions.
    pub fn decide(&self, case: &Case, policy: &PolicyVersion) -> Decision {
        let applied = resolve_thresholds(&policy.policy, &case.platform);
        let (action, reason) = Self::classify(case, &applied);
        debug!(
            case_id = %case.id,
            action = action.as_str(),
            policy_version = policy.version,
            "decided action"
        );
        Decision {
            case_id: case.id.clone(),
            action,
            policy_version: policy.version,
            priority: case.priority,
            priority_rank: case.priority_rank,
            confidence: case.confidence,
            approve_threshold: applied.approve,
            reject_threshold: applied.reject,
            threshold_source: applied.source,
            reason,
        }
    }

    fn classify(case: &Case, applied: &AppliedThresholds) -> (Action, String) {
        if applied.force_manual_review {
            return (
                Action::ManualReview,
                format!("automation disabled for platform {}", case.platform.trim()),
            );
        }
        if case.confidence >= applied.approve && case.priority != PriorityClass::Low {
            return (
                Action::AutoApprove,
                format!(
                    "confidence {} >= approve threshold {} at {} priority",
                    case.confidence, applied.approve, case.priority
                ),
            );
        }
        if case.confidence <= applied.reject {
            return (
                Action::AutoReject,
                format!(
                    "confidence {} <= reject threshold {}",
                    case.confidence, applied.reject
                ),
            );
        }
        let reason = if case.confidence >= applied.approve {
            "low priority cases are never approved automatically".to_string()
        } else {
            format!(
                "confidence {} inside review band ({}, {})",
                case.confidence, applied.reject, applied.approve
            )
        };
        (Action::ManualReview, reason)
    }
}
