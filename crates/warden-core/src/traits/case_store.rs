use chrono::{DateTime, Utc};

use crate::errors::WardenResult;
use crate::models::{Case, CaseFilter, CaseStatus, TakedownRequest};

/// A conditional status write: applied only if the stored case still has
/// `expected_status` at `expected_version`.
#[derive(Debug, Clone)]
pub struct CaseTransition {
    pub case_id: String,
    pub expected_status: CaseStatus,
    pub expected_version: u64,
    pub next_status: CaseStatus,
    /// Replaces the stored takedown reference when set.
    pub takedown_request_id: Option<String>,
    /// Recorded as the policy behind the transition when set.
    pub policy_version: Option<u64>,
    pub at: DateTime<Utc>,
}

/// Result of a compare-and-swap.
#[derive(Debug, Clone)]
pub enum CasOutcome {
    /// The write landed; the case as stored afterwards.
    Swapped(Case),
    /// Another writer got there first; the case as currently stored.
    Conflict(Case),
}

/// Durable case and takedown storage. The single source of truth.
pub trait ICaseStore: Send + Sync {
    // --- Cases ---
    fn get(&self, id: &str) -> WardenResult<Option<Case>>;
    /// Insert a new case. Fails with `ValidationError` if the id is taken;
    /// the stored case is left as it was.
    fn insert(&self, case: &Case) -> WardenResult<()>;
    /// Insert or replace non-status fields. Status and version are only
    /// changed through [`ICaseStore::compare_and_swap_status`] once a case exists.
    fn save(&self, case: &Case) -> WardenResult<()>;
    fn query(&self, filter: &CaseFilter) -> WardenResult<Vec<Case>>;
    fn compare_and_swap_status(&self, transition: &CaseTransition) -> WardenResult<CasOutcome>;
    /// Compare-and-swap the case status and overwrite `request` in the same
    /// write. On conflict neither the case nor the request changes.
    fn resolve_takedown(
        &self,
        transition: &CaseTransition,
        request: &TakedownRequest,
    ) -> WardenResult<CasOutcome>;

    // --- Takedown requests ---
    /// Insert a new request. Fails with `ActiveTakedownExists` if the case
    /// already has an active one.
    fn insert_takedown_request(&self, request: &TakedownRequest) -> WardenResult<()>;
    /// Overwrite an existing request.
    fn save_takedown_request(&self, request: &TakedownRequest) -> WardenResult<()>;
    fn get_takedown_request(&self, id: &str) -> WardenResult<Option<TakedownRequest>>;
    fn active_takedown_for_case(&self, case_id: &str) -> WardenResult<Option<TakedownRequest>>;
    /// Delivered requests whose deadline is before `now`.
    fn takedowns_past_deadline(&self, now: DateTime<Utc>) -> WardenResult<Vec<TakedownRequest>>;
    /// Requests still waiting for delivery.
    fn pending_takedowns(&self) -> WardenResult<Vec<TakedownRequest>>;
}
