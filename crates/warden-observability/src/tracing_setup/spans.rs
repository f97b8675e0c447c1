//! Span definitions per engine operation: scoring, decision, transition,
//! dispatch, batch, sweep.

/// Create a scoring span.
#[macro_export]
macro_rules! scoring_span {
    ($case_id:expr) => {
        tracing::info_span!("warden.scoring", case_id = %$case_id)
    };
}

/// Create a decision span.
#[macro_export]
macro_rules! decision_span {
    ($case_id:expr, $policy_version:expr) => {
        tracing::info_span!("warden.decision", case_id = %$case_id, policy_version = $policy_version)
    };
}

/// Create a state transition span.
#[macro_export]
macro_rules! transition_span {
    ($case_id:expr, $trigger:expr) => {
        tracing::info_span!("warden.transition", case_id = %$case_id, trigger = %$trigger)
    };
}

/// Create a dispatch span.
#[macro_export]
macro_rules! dispatch_span {
    ($case_id:expr, $request_id:expr) => {
        tracing::info_span!("warden.dispatch", case_id = %$case_id, request_id = %$request_id)
    };
}

/// Create a batch span.
#[macro_export]
macro_rules! batch_span {
    ($job_id:expr, $action:expr, $items:expr) => {
        tracing::info_span!("warden.batch", job_id = %$job_id, action = %$action, items = $items)
    };
}

/// Create an expiry sweep span.
#[macro_export]
macro_rules! sweep_span {
    () => {
        tracing::info_span!("warden.sweep")
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const SCORING: &str = "warden.scoring";
    pub const DECISION: &str = "warden.decision";
    pub const TRANSITION: &str = "warden.transition";
    pub const DISPATCH: &str = "warden.dispatch";
    pub const BATCH: &str = "warden.batch";
    pub const SWEEP: &str = "warden.sweep";
}
