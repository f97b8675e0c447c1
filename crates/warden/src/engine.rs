//! TriageEngine: owns every component over one store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::info;

use warden_batch::{BatchHandle, BatchOrchestrator, CancellationToken};
use warden_core::config::WardenConfig;
use warden_core::errors::WardenResult;
use warden_core::models::{
    normalize_platform, Actor, AutomationPolicy, BatchAction, BatchJob, Case, CaseEvent,
    CaseFilter, CaseIntake, ComplianceSignal, Decision, PolicyPatch, PolicyVersion,
    TakedownRequest,
};
use warden_core::traits::{ICaseStore, INoticeDispatcher};
use warden_events::{EventPublisher, Subscription, SubscriptionFilter};
use warden_lifecycle::{LifecycleEngine, ResumeReport, SweepReport};
use warden_observability::{EngineMetrics, MetricsSnapshot};
use warden_rules::PolicyRegistry;
use warden_scoring::ScoringEngine;
use warden_storage::StorageEngine;

use crate::executor::PipelineExecutor;
use crate::pipeline::{ApprovalOutcome, IngestOutcome, Preview, TriagePipeline};
use crate::scheduler;

pub struct TriageEngine<D: INoticeDispatcher + 'static> {
    pipeline: Arc<TriagePipeline<D>>,
    batches: BatchOrchestrator<PipelineExecutor<D>>,
    store: Arc<StorageEngine>,
    publisher: Arc<EventPublisher>,
    policies: Arc<PolicyRegistry>,
    metrics: Arc<EngineMetrics>,
    config: WardenConfig,
}

impl<D: INoticeDispatcher + 'static> TriageEngine<D> {
    /// Open the configured database file and build the engine.
    pub fn open(config: WardenConfig, dispatcher: D) -> WardenResult<Self> {
        let store = Arc::new(StorageEngine::from_config(&config.storage)?);
        Self::with_store(config, store, dispatcher)
    }

    /// Engine over a private in-memory database.
    pub fn in_memory(config: WardenConfig, dispatcher: D) -> WardenResult<Self> {
        let store = Arc::new(StorageEngine::open_in_memory()?);
        Self::with_store(config, store, dispatcher)
    }

    /// Build every component over an existing store.
    ///
    /// The policy registry resumes from the latest stored version; the
    /// configured policy is only published into an empty store.
    pub fn with_store(
        config: WardenConfig,
        store: Arc<StorageEngine>,
        dispatcher: D,
    ) -> WardenResult<Self> {
        let scoring = ScoringEngine::new(config.scoring.clone())?;
        let policies = Arc::new(PolicyRegistry::with_store(
            config.policy.clone(),
            store.clone(),
        )?);
        let metrics = Arc::new(EngineMetrics::new());
        let publisher = Arc::new(EventPublisher::new(store.clone(), config.events.clone()));
        let case_store: Arc<dyn ICaseStore> = store.clone();

        let lifecycle = LifecycleEngine::new(
            case_store.clone(),
            Arc::new(dispatcher),
            publisher.clone(),
            policies.clone(),
            metrics.clone(),
            &config.lifecycle,
        );
        let pipeline = Arc::new(TriagePipeline::new(
            case_store,
            scoring,
            policies.clone(),
            lifecycle,
            publisher.clone(),
            metrics.clone(),
        ));
        let batches = BatchOrchestrator::new(
            Arc::new(PipelineExecutor::new(pipeline.clone())),
            metrics.clone(),
            config.batch.clone(),
        )
        .with_store(store.clone());

        info!(policy_version = policies.current().version, "triage engine ready");
        Ok(Self {
            pipeline,
            batches,
            store,
            publisher,
            policies,
            metrics,
            config,
        })
    }

    pub fn config(&self) -> &WardenConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<StorageEngine> {
        &self.store
    }

    // ── Cases ─────────────────────────────────────────────────────────────

    pub async fn ingest(&self, intake: CaseIntake) -> WardenResult<IngestOutcome> {
        self.pipeline.ingest(intake).await
    }

    pub fn case(&self, case_id: &str) -> WardenResult<Case> {
        self.pipeline.load_case(case_id)
    }

    pub fn takedown(&self, request_id: &str) -> WardenResult<Option<TakedownRequest>> {
        self.store.get_takedown_request(request_id)
    }

    /// Cases matching `filter`, re-scored as of now and ordered for review.
    pub fn queue(&self, filter: &CaseFilter) -> WardenResult<Vec<Case>> {
        let cases = self.store.query(filter)?;
        Ok(self.pipeline.scoring().rank_queue(cases, Utc::now()))
    }

    // ── Decisions ─────────────────────────────────────────────────────────

    pub fn decide(&self, case_id: &str) -> WardenResult<Decision> {
        self.pipeline.decide(case_id)
    }

    pub fn decide_with_version(&self, case_id: &str, version: u64) -> WardenResult<Decision> {
        self.pipeline.decide_with_version(case_id, version)
    }

    pub fn preview(&self, case_id: &str) -> WardenResult<Preview> {
        self.pipeline.preview(case_id, Utc::now())
    }

    pub fn preview_intake(&self, intake: CaseIntake) -> WardenResult<Preview> {
        self.pipeline.preview_intake(intake)
    }

    // ── Reviewer actions ──────────────────────────────────────────────────

    pub async fn approve(&self, case_id: &str, actor: &Actor) -> WardenResult<ApprovalOutcome> {
        self.pipeline.approve(case_id, actor).await
    }

    pub async fn reject_false_positive(&self, case_id: &str, actor: &Actor) -> WardenResult<Case> {
        self.pipeline.reject_false_positive(case_id, actor).await
    }

    pub async fn dispatch(&self, case_id: &str, actor: &Actor) -> WardenResult<TakedownRequest> {
        self.pipeline.dispatch(case_id, actor).await
    }

    // ── Takedown lifecycle ────────────────────────────────────────────────

    pub async fn handle_signal(&self, signal: &ComplianceSignal) -> WardenResult<TakedownRequest> {
        self.pipeline.lifecycle().apply_signal(signal).await
    }

    pub async fn run_expiry_sweep(&self, now: DateTime<Utc>) -> WardenResult<SweepReport> {
        self.pipeline.lifecycle().sweep_expired(now).await
    }

    pub async fn resume_pending(&self) -> WardenResult<ResumeReport> {
        self.pipeline.lifecycle().resume_pending().await
    }

    /// Sweep on the configured interval until `stop` is cancelled.
    pub fn spawn_expiry_scheduler(&self, stop: CancellationToken) -> JoinHandle<()> {
        scheduler::spawn_expiry_scheduler(
            self.pipeline.clone(),
            self.config.lifecycle.expiry_sweep_interval(),
            stop,
        )
    }

    // ── Batches ───────────────────────────────────────────────────────────

    /// Start a batch job. Without an explicit concurrency the policy's
    /// batching preference applies.
    pub fn submit_batch(
        &self,
        action: BatchAction,
        case_ids: Vec<String>,
        concurrency: Option<usize>,
    ) -> WardenResult<BatchHandle> {
        let policy = self.policies.current();
        let concurrency = concurrency.unwrap_or(policy.policy.batching.default_concurrency);
        let case_ids = if policy.policy.batching.group_by_platform {
            self.group_by_platform(case_ids)?
        } else {
            case_ids
        };
        self.batches.submit(action, case_ids, concurrency)
    }

    pub fn batch(&self, job_id: &str) -> WardenResult<BatchJob> {
        self.batches.get(job_id)
    }

    pub fn batch_handle(&self, job_id: &str) -> Option<BatchHandle> {
        self.batches.handle(job_id)
    }

    pub fn cancel_batch(&self, job_id: &str) -> WardenResult<()> {
        self.batches.cancel(job_id)
    }

    /// Stable reorder so cases of one platform are adjacent. Unknown ids
    /// keep their place at the end and fail as items.
    fn group_by_platform(&self, case_ids: Vec<String>) -> WardenResult<Vec<String>> {
        let mut keyed = Vec::with_capacity(case_ids.len());
        for id in case_ids {
            let platform = self.store.get(&id)?.map(|c| normalize_platform(&c.platform));
            keyed.push((platform.is_none(), platform, id));
        }
        keyed.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
        Ok(keyed.into_iter().map(|(_, _, id)| id).collect())
    }

    // ── Events ────────────────────────────────────────────────────────────

    pub fn subscribe(&self, filter: SubscriptionFilter) -> Subscription {
        self.publisher.subscribe(filter)
    }

    pub fn unsubscribe(&self, subscription_id: u64) -> bool {
        self.publisher.unsubscribe(subscription_id)
    }

    pub fn replay(&self, case_id: &str, after_sequence: u64) -> WardenResult<Vec<CaseEvent>> {
        self.publisher.replay(case_id, after_sequence)
    }

    // ── Policy ────────────────────────────────────────────────────────────

    pub fn policy(&self) -> Arc<PolicyVersion> {
        self.policies.current()
    }

    pub fn policy_version(&self, version: u64) -> WardenResult<Arc<PolicyVersion>> {
        self.policies.get(version)
    }

    /// Publish a new policy version. Decisions already made keep theirs.
    pub fn replace_policy(&self, policy: AutomationPolicy) -> WardenResult<Arc<PolicyVersion>> {
        self.policies.replace(policy)
    }

    pub fn patch_policy(&self, patch: &PolicyPatch) -> WardenResult<Arc<PolicyVersion>> {
        self.policies.patch(patch)
    }

    // ── Observability ─────────────────────────────────────────────────────

    pub fn metrics(&self) -> MetricsSnapshot {
        let mut snapshot = self.metrics.snapshot();
        snapshot.events_dropped = self.publisher.dropped_events();
        snapshot
    }
}
