//! Orchestrator tests: independent outcomes, bounded concurrency,
//! cancellation, de-duplication, and persistence.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use warden_batch::{BatchOrchestrator, IItemExecutor};
use warden_core::config::BatchConfig;
use warden_core::errors::{TransitionError, WardenError, WardenResult};
use warden_core::models::{Actor, BatchAction, BatchStatus, CaseStatus, ItemOutcome, Trigger};
use warden_core::traits::IBatchJobStore;
use warden_observability::EngineMetrics;

#[derive(Default)]
struct FakeExecutor {
    fail_on: HashSet<String>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeExecutor {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    fn failing_on(case_id: &str) -> Self {
        Self {
            fail_on: HashSet::from([case_id.to_string()]),
            ..Default::default()
        }
    }
}

impl IItemExecutor for FakeExecutor {
    async fn execute(&self, _action: BatchAction, case_id: &str, actor: &Actor) -> WardenResult<()> {
        assert!(matches!(actor, Actor::Batch { .. }));
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_on.contains(case_id) {
            return Err(TransitionError::InvalidTransition {
                case_id: case_id.to_string(),
                current: CaseStatus::Removed,
                trigger: Trigger::Approve,
            }
            .into());
        }
        Ok(())
    }
}

fn orchestrator(executor: FakeExecutor) -> (BatchOrchestrator<FakeExecutor>, Arc<FakeExecutor>) {
    let executor = Arc::new(executor);
    let orchestrator = BatchOrchestrator::new(
        executor.clone(),
        Arc::new(EngineMetrics::new()),
        BatchConfig::default(),
    );
    (orchestrator, executor)
}

fn ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("c-{i}")).collect()
}

#[tokio::test]
async fn one_failure_leaves_the_rest_succeeded() {
    let (orchestrator, executor) = orchestrator(FakeExecutor::failing_on("c-7"));
    let handle = orchestrator.submit(BatchAction::Approve, ids(20), 4).unwrap();
    let job = handle.wait().await;

    assert_eq!(job.status, BatchStatus::Completed);
    let progress = job.progress();
    assert_eq!((progress.succeeded, progress.failed, progress.pending), (19, 1, 0));
    assert_eq!(progress.percent_complete, 100.0);

    let failures = job.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "c-7");
    assert!(failures[0].1.contains("removed"), "reason: {}", failures[0].1);
    assert_eq!(executor.calls.load(Ordering::SeqCst), 20);
}

#[tokio::test]
async fn cancel_mid_run_marks_remainder_not_attempted() {
    let (orchestrator, executor) = orchestrator(FakeExecutor::with_delay(Duration::from_millis(20)));
    let handle = orchestrator.submit(BatchAction::Dispatch, ids(100), 10).unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;
    handle.cancel();
    let job = handle.wait().await;

    assert_eq!(job.status, BatchStatus::Cancelled);
    let progress = job.progress();
    assert_eq!(progress.failed, 0);
    assert_eq!(progress.pending, 0);
    assert!(progress.succeeded <= 100);
    assert!(progress.not_attempted > 0);
    assert_eq!(progress.succeeded + progress.not_attempted, 100);
    assert_eq!(executor.calls.load(Ordering::SeqCst), progress.succeeded);
    assert!(job
        .outcomes
        .iter()
        .skip(progress.succeeded)
        .all(|o| *o == ItemOutcome::NotAttempted));
}

#[tokio::test]
async fn concurrency_bound_is_respected() {
    let (orchestrator, executor) = orchestrator(FakeExecutor::with_delay(Duration::from_millis(5)));
    let handle = orchestrator.submit(BatchAction::Triage, ids(30), 3).unwrap();
    handle.wait().await;
    assert!(executor.max_in_flight.load(Ordering::SeqCst) <= 3);
    assert_eq!(executor.calls.load(Ordering::SeqCst), 30);
}

#[tokio::test]
async fn concurrency_is_validated_and_capped() {
    let (orchestrator, _) = orchestrator(FakeExecutor::default());
    let err = orchestrator.submit(BatchAction::Approve, ids(3), 0).unwrap_err();
    assert!(matches!(err, WardenError::ValidationError(_)));

    let handle = orchestrator.submit(BatchAction::Approve, ids(3), 10_000).unwrap();
    assert_eq!(handle.snapshot().max_concurrency, BatchConfig::default().max_concurrency);
}

#[tokio::test]
async fn oversized_batch_is_rejected() {
    let executor = Arc::new(FakeExecutor::default());
    let orchestrator = BatchOrchestrator::new(
        executor,
        Arc::new(EngineMetrics::new()),
        BatchConfig {
            max_concurrency: 4,
            max_items: 5,
        },
    );
    let err = orchestrator.submit(BatchAction::Approve, ids(6), 2).unwrap_err();
    assert!(matches!(err, WardenError::ValidationError(_)));
}

#[tokio::test]
async fn duplicate_ids_run_once() {
    let (orchestrator, executor) = orchestrator(FakeExecutor::default());
    let submitted = ["a", "b", "a", "c", "b"].map(String::from).to_vec();
    let job = orchestrator
        .submit(BatchAction::RejectFalsePositive, submitted, 2)
        .unwrap()
        .wait()
        .await;
    assert_eq!(job.case_ids, vec!["a", "b", "c"]);
    assert_eq!(executor.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn empty_batch_completes_immediately() {
    let (orchestrator, _) = orchestrator(FakeExecutor::default());
    let job = orchestrator
        .submit(BatchAction::Approve, Vec::new(), 1)
        .unwrap()
        .wait()
        .await;
    assert_eq!(job.status, BatchStatus::Completed);
    assert_eq!(job.progress().total, 0);
}

#[tokio::test]
async fn progress_can_be_watched() {
    let (orchestrator, _) = orchestrator(FakeExecutor::with_delay(Duration::from_millis(2)));
    let handle = orchestrator.submit(BatchAction::Approve, ids(10), 2).unwrap();
    let mut rx = handle.watch_progress();
    let done = rx
        .wait_for(|p| p.succeeded == 10)
        .await
        .map(|p| p.percent_complete)
        .unwrap();
    assert_eq!(done, 100.0);
}

#[tokio::test]
async fn finished_jobs_are_persisted_and_retrievable() {
    let store = test_fixtures::open_store();
    let executor = Arc::new(FakeExecutor::failing_on("c-1"));
    let orchestrator = BatchOrchestrator::new(
        executor,
        Arc::new(EngineMetrics::new()),
        BatchConfig::default(),
    )
    .with_store(store.clone());

    let handle = orchestrator.submit(BatchAction::Dispatch, ids(3), 2).unwrap();
    let id = handle.id().to_string();
    handle.wait().await;

    let stored = store.get_batch_job(&id).unwrap().unwrap();
    assert_eq!(stored.status, BatchStatus::Completed);
    assert_eq!(stored.progress().failed, 1);
    assert!(stored.completed_at.is_some());

    // A later submission prunes finished jobs; lookups fall back to the store.
    orchestrator.submit(BatchAction::Approve, ids(1), 1).unwrap().wait().await;
    assert_eq!(orchestrator.get(&id).unwrap().progress().succeeded, 2);
}

#[tokio::test]
async fn unknown_job_is_reported() {
    let (orchestrator, _) = orchestrator(FakeExecutor::default());
    assert!(matches!(
        orchestrator.get("nope"),
        Err(WardenError::BatchNotFound { .. })
    ));
    assert!(orchestrator.cancel("nope").is_err());
    assert!(orchestrator.handle("nope").is_none());
}
