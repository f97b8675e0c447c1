use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::errors::WardenError;

/// Action applied to every case of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BatchAction {
    /// Manual approval: `detected -> verified`, then dispatch when the policy auto-dispatches.
    Approve,
    /// Manual rejection: `detected|verified -> false_positive`.
    RejectFalsePositive,
    /// Dispatch a takedown for a verified case.
    Dispatch,
    /// Re-score, decide, and apply the automated action.
    Triage,
}

impl BatchAction {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchAction::Approve => "approve",
            BatchAction::RejectFalsePositive => "reject_false_positive",
            BatchAction::Dispatch => "dispatch",
            BatchAction::Triage => "triage",
        }
    }
}

impl FromStr for BatchAction {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(BatchAction::Approve),
            "reject_false_positive" => Ok(BatchAction::RejectFalsePositive),
            "dispatch" => Ok(BatchAction::Dispatch),
            "triage" => Ok(BatchAction::Triage),
            other => Err(WardenError::ValidationError(format!(
                "unknown batch action: {other}"
            ))),
        }
    }
}

impl fmt::Display for BatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one batch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ItemOutcome {
    Pending,
    Succeeded,
    Failed { reason: String },
    /// The batch was cancelled before this item was scheduled.
    NotAttempted,
}

impl ItemOutcome {
    pub fn is_finished(&self) -> bool {
        matches!(self, ItemOutcome::Succeeded | ItemOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Running,
    Completed,
    Cancelled,
}

impl BatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchStatus::Running => "running",
            BatchStatus::Completed => "completed",
            BatchStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for BatchStatus {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(BatchStatus::Running),
            "completed" => Ok(BatchStatus::Completed),
            "cancelled" => Ok(BatchStatus::Cancelled),
            other => Err(WardenError::ValidationError(format!(
                "unknown batch status: {other}"
            ))),
        }
    }
}

/// A bulk operation over many cases with per-item outcomes.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BatchJob {
    pub id: String,
    pub action: BatchAction,
    /// Target case ids, in submission order.
    pub case_ids: Vec<String>,
    /// `outcomes[i]` belongs to `case_ids[i]`.
    pub outcomes: Vec<ItemOutcome>,
    pub status: BatchStatus,
    pub max_concurrency: usize,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl BatchJob {
    pub fn new(
        action: BatchAction,
        case_ids: Vec<String>,
        max_concurrency: usize,
        now: DateTime<Utc>,
    ) -> Self {
        let outcomes = vec![ItemOutcome::Pending; case_ids.len()];
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            action,
            case_ids,
            outcomes,
            status: BatchStatus::Running,
            max_concurrency,
            created_at: now,
            completed_at: None,
        }
    }

    pub fn progress(&self) -> BatchProgress {
        BatchProgress::from_outcomes(&self.outcomes)
    }

    /// Failed items paired with their case ids.
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.case_ids
            .iter()
            .zip(&self.outcomes)
            .filter_map(|(id, outcome)| match outcome {
                ItemOutcome::Failed { reason } => Some((id.as_str(), reason.as_str())),
                _ => None,
            })
            .collect()
    }
}

/// Snapshot of batch progress.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BatchProgress {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub pending: usize,
    pub not_attempted: usize,
    /// Finished items (succeeded + failed) as a percentage of all items.
    pub percent_complete: f64,
}

impl BatchProgress {
    pub fn from_outcomes(outcomes: &[ItemOutcome]) -> Self {
        let mut progress = BatchProgress {
            total: outcomes.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                ItemOutcome::Pending => progress.pending += 1,
                ItemOutcome::Succeeded => progress.succeeded += 1,
                ItemOutcome::Failed { .. } => progress.failed += 1,
                ItemOutcome::NotAttempted => progress.not_attempted += 1,
            }
        }
        if progress.total > 0 {
            progress.percent_complete =
                (progress.succeeded + progress.failed) as f64 / progress.total as f64 * 100.0;
        }
        progress
    }
}
