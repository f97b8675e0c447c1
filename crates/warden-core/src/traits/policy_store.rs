use crate::errors::WardenResult;
use crate::models::PolicyVersion;

/// Durable history of published automation policies.
pub trait IPolicyStore: Send + Sync {
    fn save_policy_version(&self, version: &PolicyVersion) -> WardenResult<()>;
    fn get_policy_version(&self, version: u64) -> WardenResult<Option<PolicyVersion>>;
    fn latest_policy_version(&self) -> WardenResult<Option<PolicyVersion>>;
}
