use crate::errors::WardenResult;
use crate::models::BatchJob;

/// Audit storage for batch jobs.
pub trait IBatchJobStore: Send + Sync {
    fn save_batch_job(&self, job: &BatchJob) -> WardenResult<()>;
    fn get_batch_job(&self, id: &str) -> WardenResult<Option<BatchJob>>;
}
