//! TriagePipeline: the per-case flows shared by direct calls and batch items.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use warden_core::errors::{DispatchError, WardenError, WardenResult};
use warden_core::models::{
    Action, Actor, Case, CaseIntake, CaseStatus, Decision, EventType, PolicyVersion,
    TakedownRequest,
};
use warden_core::traits::{ICaseStore, INoticeDispatcher};
use warden_events::EventPublisher;
use warden_lifecycle::LifecycleEngine;
use warden_observability::EngineMetrics;
use warden_rules::{PolicyRegistry, RuleEngine};
use warden_scoring::{ScoreBreakdown, ScoringEngine};

/// What `ingest` did with a new case.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    /// The case as stored after the automated action.
    pub case: Case,
    pub decision: Decision,
    /// Request created by an automatic dispatch, if any.
    pub takedown: Option<TakedownRequest>,
    /// Set when the case was approved but dispatching failed.
    pub dispatch_error: Option<String>,
}

/// Result of an approval, with the follow-up dispatch when the policy asks for one.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalOutcome {
    pub case: Case,
    pub takedown: Option<TakedownRequest>,
}

/// Score and decision for a case, computed without touching it.
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub breakdown: ScoreBreakdown,
    pub decision: Decision,
}

pub struct TriagePipeline<D: INoticeDispatcher> {
    store: Arc<dyn ICaseStore>,
    scoring: ScoringEngine,
    rules: RuleEngine,
    policies: Arc<PolicyRegistry>,
    lifecycle: LifecycleEngine<D>,
    publisher: Arc<EventPublisher>,
    metrics: Arc<EngineMetrics>,
}

impl<D: INoticeDispatcher> TriagePipeline<D> {
    pub fn new(
        store: Arc<dyn ICaseStore>,
        scoring: ScoringEngine,
        policies: Arc<PolicyRegistry>,
        lifecycle: LifecycleEngine<D>,
        publisher: Arc<EventPublisher>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            store,
            scoring,
            rules: RuleEngine::new(),
            policies,
            lifecycle,
            publisher,
            metrics,
        }
    }

    pub fn lifecycle(&self) -> &LifecycleEngine<D> {
        &self.lifecycle
    }

    pub fn scoring(&self) -> &ScoringEngine {
        &self.scoring
    }

    pub fn policies(&self) -> &PolicyRegistry {
        &self.policies
    }

    // ── Intake ────────────────────────────────────────────────────────────

    /// Validate, score, and store a scanner record, then decide and apply
    /// the automated action.
    ///
    /// A case id that is already stored is refused; redelivered intake never
    /// re-triages a case.
    #[instrument(skip_all, fields(platform = %intake.platform))]
    pub async fn ingest(&self, intake: CaseIntake) -> WardenResult<IngestOutcome> {
        let now = Utc::now();
        let mut case = intake.into_case(now)?;
        {
            let _span = warden_observability::scoring_span!(case.id).entered();
            self.scoring.apply(&mut case, now);
        }
        self.store.insert(&case)?;
        self.metrics.record_ingest();
        info!(case_id = %case.id, priority = %case.priority, rank = case.priority_rank, "case ingested");
        self.emit(
            &case.id,
            EventType::CaseIngested,
            json!({
                "platform": case.platform,
                "confidence": case.confidence,
                "priority": case.priority,
                "priority_rank": case.priority_rank,
            }),
        );

        let policy = self.policies.current();
        let decision = self.decide_case(&case, &policy);
        let (takedown, dispatch_error) = self.act_on(&decision, &policy).await?;

        let case = self.load_case(&case.id)?;
        Ok(IngestOutcome {
            case,
            decision,
            takedown,
            dispatch_error: dispatch_error.map(|e| e.to_string()),
        })
    }

    /// Re-score a stored `detected` case, decide under the current policy,
    /// and apply the action.
    pub async fn triage(&self, case_id: &str) -> WardenResult<Decision> {
        let mut case = self.load_case(case_id)?;
        if case.status != CaseStatus::Detected {
            return Err(WardenError::ValidationError(format!(
                "case {case_id} is {}; only detected cases are triaged",
                case.status
            )));
        }
        self.scoring.apply(&mut case, Utc::now());
        self.store.save(&case)?;

        let policy = self.policies.current();
        let decision = self.decide_case(&case, &policy);
        if let (_, Some(error)) = self.act_on(&decision, &policy).await? {
            return Err(error.into());
        }
        Ok(decision)
    }

    // ── Decisions ─────────────────────────────────────────────────────────

    /// Decide a stored case under the current policy and emit `action_decided`.
    /// Never changes the case.
    pub fn decide(&self, case_id: &str) -> WardenResult<Decision> {
        let case = self.load_case(case_id)?;
        Ok(self.decide_case(&case, &self.policies.current()))
    }

    /// Decide a stored case under a specific published policy version, without events.
    pub fn decide_with_version(&self, case_id: &str, version: u64) -> WardenResult<Decision> {
        let case = self.load_case(case_id)?;
        let policy = self.policies.get(version)?;
        Ok(self.rules.decide(&case, &policy))
    }

    /// Score and decide a stored case as of `now`, with no mutation and no event.
    pub fn preview(&self, case_id: &str, now: DateTime<Utc>) -> WardenResult<Preview> {
        let mut case = self.load_case(case_id)?;
        Ok(self.preview_case(&mut case, now))
    }

    /// Score and decide an intake record that has not been stored.
    pub fn preview_intake(&self, intake: CaseIntake) -> WardenResult<Preview> {
        let now = Utc::now();
        let mut case = intake.into_case(now)?;
        Ok(self.preview_case(&mut case, now))
    }

    fn preview_case(&self, case: &mut Case, now: DateTime<Utc>) -> Preview {
        let breakdown = self.scoring.score_breakdown(case, now);
        case.priority = breakdown.priority;
        case.priority_rank = breakdown.rank;
        let decision = self.rules.decide(case, &self.policies.current());
        Preview {
            breakdown,
            decision,
        }
    }

    fn decide_case(&self, case: &Case, policy: &PolicyVersion) -> Decision {
        let decision = {
            let _span = warden_observability::decision_span!(case.id, policy.version).entered();
            self.rules.decide(case, policy)
        };
        self.metrics.record_decision(decision.action);
        self.emit(
            &case.id,
            EventType::ActionDecided,
            serde_json::to_value(&decision).unwrap_or_else(|_| json!({ "action": decision.action })),
        );
        decision
    }

    /// Apply an automated decision. Dispatch failures after an approval are
    /// reported, not raised; the lifecycle has already recorded them.
    async fn act_on(
        &self,
        decision: &Decision,
        policy: &PolicyVersion,
    ) -> WardenResult<(Option<TakedownRequest>, Option<DispatchError>)> {
        let actor = Actor::Automation {
            policy_version: policy.version,
        };
        match decision.action {
            Action::AutoApprove => {
                self.lifecycle.approve(&decision.case_id, &actor).await?;
                if !policy.policy.auto_dispatch {
                    return Ok((None, None));
                }
                match self.lifecycle.dispatch(&decision.case_id, &actor).await {
                    Ok(request) => Ok((Some(request), None)),
                    Err(WardenError::DispatchError(e)) => {
                        warn!(case_id = %decision.case_id, error = %e, "automatic dispatch failed");
                        Ok((None, Some(e)))
                    }
                    Err(e) => Err(e),
                }
            }
            Action::AutoReject => {
                self.lifecycle
                    .mark_false_positive(&decision.case_id, &actor)
                    .await?;
                Ok((None, None))
            }
            Action::ManualReview => Ok((None, None)),
        }
    }

    // ── Reviewer actions ──────────────────────────────────────────────────

    /// Approve a case, then dispatch when the current policy auto-dispatches.
    pub async fn approve(&self, case_id: &str, actor: &Actor) -> WardenResult<ApprovalOutcome> {
        let case = self.lifecycle.approve(case_id, actor).await?;
        if !self.policies.current().policy.auto_dispatch {
            return Ok(ApprovalOutcome {
                case,
                takedown: None,
            });
        }
        let takedown = self.lifecycle.dispatch(case_id, actor).await?;
        Ok(ApprovalOutcome {
            case: self.load_case(case_id)?,
            takedown: Some(takedown),
        })
    }

    pub async fn reject_false_positive(&self, case_id: &str, actor: &Actor) -> WardenResult<Case> {
        self.lifecycle.mark_false_positive(case_id, actor).await
    }

    pub async fn dispatch(&self, case_id: &str, actor: &Actor) -> WardenResult<TakedownRequest> {
        self.lifecycle.dispatch(case_id, actor).await
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    pub fn load_case(&self, case_id: &str) -> WardenResult<Case> {
        self.store
            .get(case_id)?
            .ok_or_else(|| WardenError::CaseNotFound {
                id: case_id.to_string(),
            })
    }

    fn emit(&self, case_id: &str, event_type: EventType, payload: serde_json::Value) {
        match self.publisher.publish(case_id, event_type, payload) {
            Ok(_) => self.metrics.record_event(),
            Err(e) => warn!(case_id, event_type = event_type.as_str(), error = %e, "failed to publish case event"),
        }
    }
}
