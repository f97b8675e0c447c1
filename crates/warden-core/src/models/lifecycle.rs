use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Inputs that drive the case state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Approve,
    MarkFalsePositive,
    Dispatch,
    ConfirmRemoval,
    Reject,
    ExhaustRetries,
    Expire,
}

impl Trigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Trigger::Approve => "approve",
            Trigger::MarkFalsePositive => "mark_false_positive",
            Trigger::Dispatch => "dispatch",
            Trigger::ConfirmRemoval => "confirm_removal",
            Trigger::Reject => "reject",
            Trigger::ExhaustRetries => "exhaust_retries",
            Trigger::Expire => "expire",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who caused a transition. Recorded in event payloads for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
    /// Automated decision under the given policy version.
    Automation { policy_version: u64 },
    /// A human reviewer.
    Reviewer { reviewer_id: String },
    /// A batch job item.
    Batch { job_id: String },
    /// The hosting platform, via the compliance signal feed.
    Platform,
    /// Scheduled maintenance (expiry sweep, recovery).
    Scheduler,
}

/// Asynchronous notification from a platform about a takedown request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceSignal {
    pub request_id: String,
    pub kind: SignalKind,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalKind {
    Acknowledged,
    Removed,
    Rejected { reason: String },
}
