//! Shared state of a running job and the handle callers hold on to.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tokio::sync::watch;

use warden_core::models::{BatchJob, BatchProgress, BatchStatus, ItemOutcome};

use crate::cancellation::{Cancellable, CancellationToken};

pub(crate) struct JobState {
    job: Mutex<BatchJob>,
    progress: watch::Sender<BatchProgress>,
    status: watch::Sender<BatchStatus>,
    pub(crate) cancel: CancellationToken,
}

impl JobState {
    pub(crate) fn new(job: BatchJob) -> Self {
        let (progress, _) = watch::channel(job.progress());
        let (status, _) = watch::channel(job.status);
        Self {
            job: Mutex::new(job),
            progress,
            status,
            cancel: CancellationToken::new(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BatchJob> {
        self.job.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn snapshot(&self) -> BatchJob {
        self.lock().clone()
    }

    /// Record one item's outcome unless it already has a final one.
    pub(crate) fn record(&self, index: usize, outcome: ItemOutcome) {
        let progress = {
            let mut job = self.lock();
            match job.outcomes.get_mut(index) {
                Some(slot) if *slot == ItemOutcome::Pending => *slot = outcome,
                _ => return,
            }
            job.progress()
        };
        self.progress.send_replace(progress);
    }

    /// Settle leftover items and stamp the final status. Waiters are not
    /// released until [`JobState::close`].
    ///
    /// Items before `scheduled` were started, so a `Pending` one there lost its
    /// task; items from `scheduled` on were never started.
    pub(crate) fn settle(&self, scheduled: usize) -> BatchJob {
        let mut job = self.lock();
        for (index, slot) in job.outcomes.iter_mut().enumerate() {
            if *slot != ItemOutcome::Pending {
                continue;
            }
            *slot = if index < scheduled {
                ItemOutcome::Failed {
                    reason: "item task aborted before reporting".to_string(),
                }
            } else {
                ItemOutcome::NotAttempted
            };
        }
        job.status = if self.cancel.is_cancelled() {
            BatchStatus::Cancelled
        } else {
            BatchStatus::Completed
        };
        job.completed_at = Some(Utc::now());
        job.clone()
    }

    pub(crate) fn close(&self, job: &BatchJob) {
        self.progress.send_replace(job.progress());
        self.status.send_replace(job.status);
    }

    pub(crate) fn is_running(&self) -> bool {
        *self.status.borrow() == BatchStatus::Running
    }
}

/// Caller-side view of a submitted batch job. Cheap to clone.
#[derive(Clone)]
pub struct BatchHandle {
    id: String,
    state: Arc<JobState>,
}

impl BatchHandle {
    pub(crate) fn new(id: String, state: Arc<JobState>) -> Self {
        Self { id, state }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn progress(&self) -> BatchProgress {
        *self.state.progress.borrow()
    }

    pub fn status(&self) -> BatchStatus {
        *self.state.status.borrow()
    }

    /// Current job record, outcomes included.
    pub fn snapshot(&self) -> BatchJob {
        self.state.snapshot()
    }

    /// Stop scheduling new items. Started items still finish.
    pub fn cancel(&self) {
        self.state.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancel.is_cancelled()
    }

    /// Receiver that sees every progress update.
    pub fn watch_progress(&self) -> watch::Receiver<BatchProgress> {
        self.state.progress.subscribe()
    }

    /// Wait until the job is completed or cancelled and return the final record.
    pub async fn wait(&self) -> BatchJob {
        let mut status = self.state.status.subscribe();
        // The sender lives in `state`, which this handle keeps alive.
        let _ = status.wait_for(|s| *s != BatchStatus::Running).await;
        self.state.snapshot()
    }
}

impl std::fmt::Debug for BatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchHandle")
            .field("id", &self.id)
            .field("status", &self.status())
            .field("progress", &self.progress())
            .finish()
    }
}
