use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::case::PriorityClass;

/// What the automation decided for a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    AutoApprove,
    AutoReject,
    ManualReview,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::AutoApprove => "auto_approve",
            Action::AutoReject => "auto_reject",
            Action::ManualReview => "manual_review",
        }
    }
}

/// Where the thresholds applied to a decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdSource {
    Global,
    PlatformOverride,
}

/// A decision together with everything needed to explain or replay it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Decision {
    pub case_id: String,
    pub action: Action,
    pub policy_version: u64,
    pub priority: PriorityClass,
    pub priority_rank: f64,
    pub confidence: f64,
    pub approve_threshold: f64,
    pub reject_threshold: f64,
    pub threshold_source: ThresholdSource,
    /// Short human-readable explanation.
    pub reason: String,
}
