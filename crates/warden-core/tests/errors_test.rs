use warden_core::errors::*;
use warden_core::models::{CaseStatus, TakedownStatus, Trigger};

#[test]
fn case_not_found_carries_id() {
    let err = WardenError::CaseNotFound {
        id: "case-123".into(),
    };
    assert!(err.to_string().contains("case-123"));
}

#[test]
fn invalid_transition_reports_current_state() {
    let err = TransitionError::InvalidTransition {
        case_id: "c1".into(),
        current: CaseStatus::Removed,
        trigger: Trigger::Approve,
    };
    let msg = err.to_string();
    assert!(msg.contains("removed"));
    assert!(msg.contains("approve"));
    assert_eq!(err.current_status(), Some(CaseStatus::Removed));
}

#[test]
fn active_takedown_message_is_actionable() {
    let err = TransitionError::ActiveTakedownExists {
        case_id: "c1".into(),
        request_id: "r1".into(),
        status: TakedownStatus::Sent,
    };
    assert!(err
        .to_string()
        .contains("already has an active takedown request"));
}

#[test]
fn transition_error_converts_and_is_conflict() {
    let err: WardenError = TransitionError::InvalidTransition {
        case_id: "c1".into(),
        current: CaseStatus::Expired,
        trigger: Trigger::Expire,
    }
    .into();
    assert!(err.is_conflict());
    assert!(!err.is_transient());
}

#[test]
fn dispatch_errors_classify_retryability() {
    assert!(DispatchError::Timeout { after_ms: 10 }.is_retryable());
    assert!(DispatchError::Network {
        reason: "reset".into()
    }
    .is_retryable());
    assert!(!DispatchError::Refused {
        reason: "unknown host".into()
    }
    .is_retryable());

    let err: WardenError = DispatchError::Network {
        reason: "reset".into(),
    }
    .into();
    assert!(err.is_transient());
}

#[test]
fn policy_error_converts_to_warden_error() {
    let err: WardenError = PolicyError::UnknownVersion { version: 9 }.into();
    assert!(matches!(err, WardenError::PolicyError(_)));
    assert!(err.to_string().contains('9'));
}

#[test]
fn storage_error_converts_to_warden_error() {
    let err: WardenError = StorageError::SqliteError {
        message: "disk full".into(),
    }
    .into();
    assert!(matches!(err, WardenError::StorageError(_)));
}
