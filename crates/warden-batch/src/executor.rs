use std::future::Future;

use warden_core::errors::WardenResult;
use warden_core::models::{Actor, BatchAction};

/// Applies a batch action to a single case.
///
/// The orchestrator knows nothing about cases; the engine facade supplies
/// an implementation that routes each action to the lifecycle.
pub trait IItemExecutor: Send + Sync + 'static {
    fn execute(
        &self,
        action: BatchAction,
        case_id: &str,
        actor: &Actor,
    ) -> impl Future<Output = WardenResult<()>> + Send;
}
