use crate::models::{CaseStatus, TakedownStatus, Trigger};

/// Conflicts raised by the lifecycle state machine.
///
/// Every variant carries the state actually observed so callers can reconcile.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error("invalid transition for case {case_id}: cannot apply {trigger} while {current}")]
    InvalidTransition {
        case_id: String,
        current: CaseStatus,
        trigger: Trigger,
    },

    #[error("case {case_id} already has an active takedown request {request_id} ({status})")]
    ActiveTakedownExists {
        case_id: String,
        request_id: String,
        status: TakedownStatus,
    },

    #[error("takedown request {request_id} cannot move from {current} to {attempted}")]
    InvalidRequestTransition {
        request_id: String,
        current: TakedownStatus,
        attempted: TakedownStatus,
    },

    #[error("case {case_id} was modified concurrently: expected {expected} at version {expected_version}, found {actual} at version {actual_version}")]
    ConcurrentModification {
        case_id: String,
        expected: CaseStatus,
        expected_version: u64,
        actual: CaseStatus,
        actual_version: u64,
    },
}

impl TransitionError {
    /// The case state observed when the conflict was detected, if case-scoped.
    pub fn current_status(&self) -> Option<CaseStatus> {
        match self {
            TransitionError::InvalidTransition { current, .. } => Some(*current),
            TransitionError::ConcurrentModification { actual, .. } => Some(*actual),
            _ => None,
        }
    }
}
