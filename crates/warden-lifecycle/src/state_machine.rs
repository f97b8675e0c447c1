//! Case transition table.

use warden_core::errors::TransitionError;
use warden_core::models::{CaseStatus, Trigger};

/// Target status for `trigger` applied in `from`, if the table allows it.
pub fn next_status(from: CaseStatus, trigger: Trigger) -> Option<CaseStatus> {
    use CaseStatus::*;
    match (from, trigger) {
        (Detected, Trigger::Approve) => Some(Verified),
        (Detected | Verified, Trigger::MarkFalsePositive) => Some(FalsePositive),
        (Verified, Trigger::Dispatch) => Some(TakedownSent),
        (TakedownSent, Trigger::ConfirmRemoval) => Some(Removed),
        (TakedownSent, Trigger::Reject | Trigger::ExhaustRetries) => Some(Rejected),
        (TakedownSent, Trigger::Expire) => Some(Expired),
        _ => None,
    }
}

/// Like [`next_status`], but reports the refusal with the observed state.
pub fn apply(case_id: &str, from: CaseStatus, trigger: Trigger) -> Result<CaseStatus, TransitionError> {
    next_status(from, trigger).ok_or_else(|| TransitionError::InvalidTransition {
        case_id: case_id.to_string(),
        current: from,
        trigger,
    })
}

/// Triggers accepted in a state.
pub fn allowed_triggers(from: CaseStatus) -> Vec<Trigger> {
    [
        Trigger::Approve,
        Trigger::MarkFalsePositive,
        Trigger::Dispatch,
        Trigger::ConfirmRemoval,
        Trigger::Reject,
        Trigger::ExhaustRetries,
        Trigger::Expire,
    ]
    .into_iter()
    .filter(|t| next_status(from, *t).is_some())
    .collect()
}
