//! BatchOrchestrator: bounded fan-out of one action over many cases.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn, Instrument};

use warden_core::config::BatchConfig;
use warden_core::errors::{WardenError, WardenResult};
use warden_core::models::{Actor, BatchAction, BatchJob, ItemOutcome};
use warden_core::traits::IBatchJobStore;
use warden_observability::EngineMetrics;

use crate::cancellation::Cancellable;
use crate::executor::IItemExecutor;
use crate::handle::{BatchHandle, JobState};

pub struct BatchOrchestrator<E: IItemExecutor> {
    executor: Arc<E>,
    store: Option<Arc<dyn IBatchJobStore>>,
    metrics: Arc<EngineMetrics>,
    config: BatchConfig,
    jobs: DashMap<String, Arc<JobState>>,
}

impl<E: IItemExecutor> BatchOrchestrator<E> {
    pub fn new(executor: Arc<E>, metrics: Arc<EngineMetrics>, config: BatchConfig) -> Self {
        Self {
            executor,
            store: None,
            metrics,
            config,
            jobs: DashMap::new(),
        }
    }

    /// Persist jobs at start and completion.
    pub fn with_store(mut self, store: Arc<dyn IBatchJobStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Start a job and return immediately.
    ///
    /// Duplicate case ids are collapsed, keeping the first occurrence.
    /// `max_concurrency` must be at least 1 and is capped by configuration.
    /// Must be called from within a tokio runtime.
    pub fn submit(
        &self,
        action: BatchAction,
        case_ids: Vec<String>,
        max_concurrency: usize,
    ) -> WardenResult<BatchHandle> {
        if max_concurrency == 0 {
            return Err(WardenError::ValidationError(
                "batch concurrency must be at least 1".to_string(),
            ));
        }
        let case_ids = dedup_in_order(case_ids);
        if case_ids.len() > self.config.max_items {
            return Err(WardenError::ValidationError(format!(
                "batch of {} items exceeds the limit of {}",
                case_ids.len(),
                self.config.max_items
            )));
        }
        let concurrency = max_concurrency.min(self.config.max_concurrency.max(1));

        let job = BatchJob::new(action, case_ids, concurrency, Utc::now());
        self.persist(&job);
        self.prune_finished();

        let id = job.id.clone();
        let state = Arc::new(JobState::new(job.clone()));
        self.jobs.insert(id.clone(), state.clone());

        info!(job_id = %id, action = %action, items = job.case_ids.len(), concurrency, "batch submitted");
        let span = warden_observability::batch_span!(id, action, job.case_ids.len());
        tokio::spawn(
            drive(
                self.executor.clone(),
                state.clone(),
                job,
                self.store.clone(),
                self.metrics.clone(),
            )
            .instrument(span),
        );
        Ok(BatchHandle::new(id, state))
    }

    /// Handle of a job still known to this process.
    pub fn handle(&self, id: &str) -> Option<BatchHandle> {
        self.jobs
            .get(id)
            .map(|state| BatchHandle::new(id.to_string(), state.clone()))
    }

    /// Current record of a job: live state first, then the store.
    pub fn get(&self, id: &str) -> WardenResult<BatchJob> {
        if let Some(state) = self.jobs.get(id) {
            return Ok(state.snapshot());
        }
        if let Some(store) = &self.store {
            if let Some(job) = store.get_batch_job(id)? {
                return Ok(job);
            }
        }
        Err(WardenError::BatchNotFound { id: id.to_string() })
    }

    pub fn cancel(&self, id: &str) -> WardenResult<()> {
        let state = self
            .jobs
            .get(id)
            .ok_or_else(|| WardenError::BatchNotFound { id: id.to_string() })?;
        state.cancel.cancel();
        debug!(job_id = id, "batch cancellation requested");
        Ok(())
    }

    /// Forget finished jobs when the store can still serve them.
    fn prune_finished(&self) {
        if self.store.is_some() {
            self.jobs.retain(|_, state| state.is_running());
        }
    }

    fn persist(&self, job: &BatchJob) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save_batch_job(job) {
                warn!(job_id = %job.id, error = %e, "failed to persist batch job");
            }
        }
    }
}

async fn drive<E: IItemExecutor>(
    executor: Arc<E>,
    state: Arc<JobState>,
    job: BatchJob,
    store: Option<Arc<dyn IBatchJobStore>>,
    metrics: Arc<EngineMetrics>,
) {
    let semaphore = Arc::new(Semaphore::new(job.max_concurrency));
    let actor = Actor::Batch {
        job_id: job.id.clone(),
    };
    let mut tasks = JoinSet::new();
    let mut scheduled = 0;

    for (index, case_id) in job.case_ids.iter().enumerate() {
        if state.cancel.is_cancelled() {
            break;
        }
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        // Cancellation may have arrived while waiting for a slot.
        if state.cancel.is_cancelled() {
            break;
        }

        let executor = executor.clone();
        let state = state.clone();
        let metrics = metrics.clone();
        let actor = actor.clone();
        let case_id = case_id.clone();
        let action = job.action;
        tasks.spawn(async move {
            let _permit = permit;
            let outcome = match executor.execute(action, &case_id, &actor).await {
                Ok(()) => ItemOutcome::Succeeded,
                Err(e) => {
                    debug!(case_id = %case_id, error = %e, "batch item failed");
                    ItemOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            metrics.record_batch_item(outcome == ItemOutcome::Succeeded);
            state.record(index, outcome);
        });
        scheduled = index + 1;
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!(job_id = %job.id, error = %e, "batch item task aborted");
        }
    }

    let finished = state.settle(scheduled);
    let progress = finished.progress();
    info!(
        job_id = %finished.id,
        status = finished.status.as_str(),
        succeeded = progress.succeeded,
        failed = progress.failed,
        not_attempted = progress.not_attempted,
        "batch finished"
    );
    if let Some(store) = store {
        if let Err(e) = store.save_batch_job(&finished) {
            warn!(job_id = %finished.id, error = %e, "failed to persist finished batch job");
        }
    }
    state.close(&finished);
}

fn dedup_in_order(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
