//! LifecycleEngine: every case status change goes through here.
//!
//! Each operation takes the per-case lock, re-reads the case from the
//! store, checks the transition table, and writes with compare-and-swap.
//! Dispatch runs outside the lock; only the state changes around it are
//! serialized.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn, Instrument};

use warden_core::config::LifecycleConfig;
use warden_core::errors::{DispatchError, TransitionError, WardenError, WardenResult};
use warden_core::models::{
    Actor, Case, CaseStatus, ComplianceSignal, EventType, SignalKind, TakedownRequest,
    TakedownStatus, Trigger,
};
use warden_core::traits::{CasOutcome, CaseTransition, DispatchReceipt, ICaseStore, INoticeDispatcher};
use warden_events::EventPublisher;
use warden_observability::EngineMetrics;
use warden_rules::PolicyRegistry;

use crate::locks::CaseLocks;
use crate::payloads;
use crate::retry::BackoffPolicy;
use crate::state_machine;

/// Outcome of one expiry sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepReport {
    /// Overdue requests found by the store query.
    pub examined: usize,
    /// Requests (and their cases) moved to expired.
    pub expired: usize,
    /// Requests resolved by someone else before the sweep got to them.
    pub skipped: usize,
    /// `(request_id, error)` for requests that could not be processed.
    pub errors: Vec<(String, String)>,
}

/// Outcome of re-dispatching requests left pending.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResumeReport {
    pub resumed: usize,
    pub delivered: usize,
    pub failed: Vec<(String, String)>,
}

pub struct LifecycleEngine<D: INoticeDispatcher> {
    store: Arc<dyn ICaseStore>,
    dispatcher: Arc<D>,
    publisher: Arc<EventPublisher>,
    policies: Arc<PolicyRegistry>,
    metrics: Arc<EngineMetrics>,
    locks: CaseLocks,
    backoff: BackoffPolicy,
    dispatch_timeout: Duration,
}

impl<D: INoticeDispatcher> LifecycleEngine<D> {
    pub fn new(
        store: Arc<dyn ICaseStore>,
        dispatcher: Arc<D>,
        publisher: Arc<EventPublisher>,
        policies: Arc<PolicyRegistry>,
        metrics: Arc<EngineMetrics>,
        config: &LifecycleConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            publisher,
            policies,
            metrics,
            locks: CaseLocks::new(config.lock_timeout()),
            backoff: BackoffPolicy::from_config(config),
            dispatch_timeout: config.dispatch_timeout(),
        }
    }

    pub fn locks(&self) -> &CaseLocks {
        &self.locks
    }

    // ── Review decisions ──────────────────────────────────────────────────

    /// `detected -> verified`. Refused while the case has an active request.
    #[instrument(skip(self, actor))]
    pub async fn approve(&self, case_id: &str, actor: &Actor) -> WardenResult<Case> {
        let _guard = self.locks.acquire(case_id).await?;
        let case = self.load_case(case_id)?;
        state_machine::apply(case_id, case.status, Trigger::Approve)?;
        if let Some(active) = self.store.active_takedown_for_case(case_id)? {
            return Err(TransitionError::ActiveTakedownExists {
                case_id: case_id.to_string(),
                request_id: active.id,
                status: active.status,
            }
            .into());
        }
        let policy_version = match actor {
            Actor::Automation { policy_version } => Some(*policy_version),
            _ => None,
        };
        self.swap(&case, Trigger::Approve, actor, None, policy_version)
    }

    /// `detected | verified -> false_positive`.
    #[instrument(skip(self, actor))]
    pub async fn mark_false_positive(&self, case_id: &str, actor: &Actor) -> WardenResult<Case> {
        let _guard = self.locks.acquire(case_id).await?;
        let case = self.load_case(case_id)?;
        let policy_version = match actor {
            Actor::Automation { policy_version } => Some(*policy_version),
            _ => None,
        };
        let updated = self.swap(&case, Trigger::MarkFalsePositive, actor, None, policy_version)?;
        self.publisher.forget(case_id);
        Ok(updated)
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    /// Open a takedown request for a verified case and deliver it.
    ///
    /// The case moves to `takedown_sent` as soon as the request exists. On
    /// delivery the request becomes `sent` with its compliance deadline. When
    /// retries run out the request and the case end `rejected` and the last
    /// error is returned.
    #[instrument(skip(self, actor))]
    pub async fn dispatch(&self, case_id: &str, actor: &Actor) -> WardenResult<TakedownRequest> {
        let request = self.open_request(case_id, actor).await?;
        self.deliver(request, actor).await
    }

    async fn open_request(&self, case_id: &str, actor: &Actor) -> WardenResult<TakedownRequest> {
        let _guard = self.locks.acquire(case_id).await?;
        let case = self.load_case(case_id)?;
        state_machine::apply(case_id, case.status, Trigger::Dispatch)?;

        let policy = self.policies.current();
        let mut request = TakedownRequest::new(&case.id, &case.platform, policy.version, Utc::now());
        self.store.insert_takedown_request(&request)?;

        if let Err(e) = self.swap(&case, Trigger::Dispatch, actor, Some(request.id.clone()), None) {
            // The case moved under us; retire the request so it never blocks the case.
            request.status = TakedownStatus::Rejected;
            request.last_error = Some(e.to_string());
            if let Err(save_err) = self.store.save_takedown_request(&request) {
                warn!(request_id = %request.id, error = %save_err, "could not retire orphaned request");
            }
            return Err(e);
        }

        info!(case_id, request_id = %request.id, "takedown request created");
        self.emit(case_id, EventType::TakedownCreated, payloads::takedown_created(&request));
        Ok(request)
    }

    /// Send a pending request until it is delivered or retries run out.
    async fn deliver(&self, request: TakedownRequest, actor: &Actor) -> WardenResult<TakedownRequest> {
        let span = warden_observability::dispatch_span!(request.case_id, request.id);
        self.deliver_with_retry(request, actor).instrument(span).await
    }

    async fn deliver_with_retry(
        &self,
        mut request: TakedownRequest,
        actor: &Actor,
    ) -> WardenResult<TakedownRequest> {
        let max_retries = self.policies.get(request.policy_version)?.policy.max_dispatch_retries;
        loop {
            self.metrics.record_dispatch_attempt();
            let attempt = tokio::time::timeout(self.dispatch_timeout, self.dispatcher.send(&request)).await;
            let result = match attempt {
                Ok(result) => result,
                Err(_) => Err(DispatchError::Timeout {
                    after_ms: self.dispatch_timeout.as_millis() as u64,
                }),
            };

            let err = match result {
                Ok(receipt) => return self.complete_delivery(&request, receipt).await,
                Err(err) => err,
            };

            self.metrics.record_dispatch_failure();
            request = self.record_failure(&request, &err).await?;
            if request.status != TakedownStatus::Pending {
                debug!(request_id = %request.id, status = %request.status, "request resolved during dispatch");
                return Ok(request);
            }
            let will_retry = err.is_retryable() && request.retry_count <= max_retries;
            self.emit(
                &request.case_id,
                EventType::DispatchFailed,
                payloads::dispatch_failed(&request, &err.to_string(), will_retry),
            );

            if !will_retry {
                return self.fail_delivery(&request, err, actor).await;
            }
            let delay = self.backoff.delay(request.retry_count - 1);
            warn!(
                request_id = %request.id,
                attempt = request.retry_count,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "dispatch failed, retrying"
            );
            tokio::time::sleep(delay).await;

            request = self.load_request(&request.id)?;
            if request.status != TakedownStatus::Pending {
                debug!(request_id = %request.id, status = %request.status, "request resolved during backoff");
                return Ok(request);
            }
        }
    }

    /// Count a failed attempt on the stored request. A request that is no
    /// longer `pending` is returned as stored and left alone.
    async fn record_failure(
        &self,
        request: &TakedownRequest,
        err: &DispatchError,
    ) -> WardenResult<TakedownRequest> {
        let _guard = self.locks.acquire(&request.case_id).await?;
        let mut stored = self.load_request(&request.id)?;
        if stored.status == TakedownStatus::Pending {
            stored.retry_count += 1;
            stored.last_error = Some(err.to_string());
            self.store.save_takedown_request(&stored)?;
        }
        Ok(stored)
    }

    async fn complete_delivery(
        &self,
        sent: &TakedownRequest,
        receipt: DispatchReceipt,
    ) -> WardenResult<TakedownRequest> {
        let _guard = self.locks.acquire(&sent.case_id).await?;
        let mut request = self.load_request(&sent.id)?;
        if request.status != TakedownStatus::Pending {
            debug!(request_id = %request.id, status = %request.status, "delivery already recorded");
            return Ok(request);
        }

        let case = self.load_case(&request.case_id)?;
        let policy = self.policies.get(request.policy_version)?;
        let window = policy
            .policy
            .compliance_window_for(&request.platform, case.jurisdiction.as_deref());
        request.mark_sent(receipt.delivered_at, window);
        self.store.save_takedown_request(&request)?;

        self.metrics.record_delivery();
        info!(
            request_id = %request.id,
            reference = %receipt.reference,
            deadline = ?request.compliance_deadline,
            "takedown delivered"
        );
        self.emit(
            &request.case_id,
            EventType::TakedownDelivered,
            payloads::takedown_delivered(&request, &receipt.reference, window),
        );
        Ok(request)
    }

    async fn fail_delivery(
        &self,
        failed: &TakedownRequest,
        err: DispatchError,
        actor: &Actor,
    ) -> WardenResult<TakedownRequest> {
        let _guard = self.locks.acquire(&failed.case_id).await?;
        let mut request = self.load_request(&failed.id)?;
        if request.status != TakedownStatus::Pending {
            debug!(request_id = %request.id, status = %request.status, "request resolved during dispatch");
            return Ok(request);
        }

        request.status = TakedownStatus::Rejected;
        let case = self.load_case(&request.case_id)?;
        let closes_case = case.status == CaseStatus::TakedownSent
            && case.takedown_request_id.as_deref() == Some(request.id.as_str());
        if closes_case {
            self.resolve(&case, Trigger::ExhaustRetries, actor, &request)?;
        } else {
            self.store.save_takedown_request(&request)?;
        }
        warn!(
            request_id = %request.id,
            attempts = request.retry_count,
            error = %err,
            "takedown dispatch abandoned"
        );
        self.emit(
            &request.case_id,
            EventType::TakedownResolved,
            payloads::takedown_resolved(&request, request.last_error.as_deref()),
        );
        if closes_case {
            self.publisher.forget(&request.case_id);
        }

        Err(if err.is_retryable() {
            DispatchError::RetriesExhausted {
                attempts: request.retry_count,
                last_error: err.to_string(),
            }
        } else {
            err
        }
        .into())
    }

    /// Re-send requests still `pending`, e.g. after a restart. The stored
    /// idempotency key is reused so a notice delivered before the crash is
    /// not sent twice.
    pub async fn resume_pending(&self) -> WardenResult<ResumeReport> {
        let pending = self.store.pending_takedowns()?;
        let mut report = ResumeReport::default();
        for request in pending {
            report.resumed += 1;
            let id = request.id.clone();
            match self.deliver(request, &Actor::Scheduler).await {
                Ok(_) => report.delivered += 1,
                Err(e) => report.failed.push((id, e.to_string())),
            }
        }
        if report.resumed > 0 {
            info!(resumed = report.resumed, delivered = report.delivered, "resumed pending takedowns");
        }
        Ok(report)
    }

    // ── Compliance signals ────────────────────────────────────────────────

    /// Apply a platform signal to a takedown request and, for final
    /// answers, to its case. A signal repeating the request's current
    /// state is accepted without effect.
    #[instrument(skip(self, signal), fields(request_id = %signal.request_id))]
    pub async fn apply_signal(&self, signal: &ComplianceSignal) -> WardenResult<TakedownRequest> {
        let case_id = self.load_request(&signal.request_id)?.case_id;
        let _guard = self.locks.acquire(&case_id).await?;
        let mut request = self.load_request(&signal.request_id)?;

        let target = match &signal.kind {
            SignalKind::Acknowledged => TakedownStatus::Acknowledged,
            SignalKind::Removed => TakedownStatus::Complied,
            SignalKind::Rejected { .. } => TakedownStatus::Rejected,
        };
        if request.status == target {
            debug!(status = %target, "duplicate compliance signal ignored");
            return Ok(request);
        }
        if !request.status.can_transition_to(target) {
            return Err(TransitionError::InvalidRequestTransition {
                request_id: request.id,
                current: request.status,
                attempted: target,
            }
            .into());
        }

        match &signal.kind {
            SignalKind::Acknowledged => {
                request.status = TakedownStatus::Acknowledged;
                request.acknowledged_at = Some(signal.received_at);
                self.store.save_takedown_request(&request)?;
                info!(request_id = %request.id, "takedown acknowledged");
                self.emit(
                    &case_id,
                    EventType::TakedownAcknowledged,
                    payloads::takedown_acknowledged(&request, signal.received_at),
                );
            }
            SignalKind::Removed | SignalKind::Rejected { .. } => {
                let (trigger, reason) = match &signal.kind {
                    SignalKind::Rejected { reason } => (Trigger::Reject, Some(reason.clone())),
                    _ => (Trigger::ConfirmRemoval, None),
                };
                let case = self.load_case(&case_id)?;
                state_machine::apply(&case_id, case.status, trigger)?;

                request.status = target;
                request.responded_at = Some(signal.received_at);
                if reason.is_some() {
                    request.last_error = reason.clone();
                }
                self.resolve(&case, trigger, &Actor::Platform, &request)?;
                self.emit(
                    &case_id,
                    EventType::TakedownResolved,
                    payloads::takedown_resolved(&request, reason.as_deref()),
                );
                self.publisher.forget(&case_id);
            }
        }
        Ok(request)
    }

    // ── Expiry ────────────────────────────────────────────────────────────

    /// Expire every delivered request whose deadline passed before `now`.
    ///
    /// Each candidate is re-read under its case lock, so requests answered
    /// in the meantime are skipped. Running the sweep again is a no-op.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> WardenResult<SweepReport> {
        self.sweep_expired_inner(now)
            .instrument(warden_observability::sweep_span!())
            .await
    }

    async fn sweep_expired_inner(&self, now: DateTime<Utc>) -> WardenResult<SweepReport> {
        let candidates = self.store.takedowns_past_deadline(now)?;

        let mut report = SweepReport {
            examined: candidates.len(),
            ..Default::default()
        };
        for candidate in candidates {
            match self.expire_one(&candidate, now).await {
                Ok(true) => report.expired += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    warn!(request_id = %candidate.id, error = %e, "expiry failed");
                    report.errors.push((candidate.id.clone(), e.to_string()));
                }
            }
        }
        self.locks.prune();

        if report.examined > 0 {
            info!(
                examined = report.examined,
                expired = report.expired,
                skipped = report.skipped,
                "expiry sweep finished"
            );
        }
        Ok(report)
    }

    async fn expire_one(&self, candidate: &TakedownRequest, now: DateTime<Utc>) -> WardenResult<bool> {
        let _guard = self.locks.acquire(&candidate.case_id).await?;
        let mut request = self.load_request(&candidate.id)?;
        if !request.is_overdue(now) {
            return Ok(false);
        }
        let case = self.load_case(&request.case_id)?;
        if case.status != CaseStatus::TakedownSent {
            debug!(case_id = %case.id, status = %case.status, "case already resolved, leaving request");
            return Ok(false);
        }

        request.status = TakedownStatus::Expired;
        request.responded_at = Some(now);
        self.resolve(&case, Trigger::Expire, &Actor::Scheduler, &request)?;
        self.metrics.record_expiry();
        self.emit(
            &case.id,
            EventType::TakedownResolved,
            payloads::takedown_resolved(&request, Some("compliance deadline passed")),
        );
        self.publisher.forget(&case.id);
        Ok(true)
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn load_case(&self, case_id: &str) -> WardenResult<Case> {
        self.store
            .get(case_id)?
            .ok_or_else(|| WardenError::CaseNotFound {
                id: case_id.to_string(),
            })
    }

    fn load_request(&self, request_id: &str) -> WardenResult<TakedownRequest> {
        self.store
            .get_takedown_request(request_id)?
            .ok_or_else(|| WardenError::TakedownNotFound {
                id: request_id.to_string(),
            })
    }

    /// Check the table and compare-and-swap. Callers hold the case lock.
    fn swap(
        &self,
        case: &Case,
        trigger: Trigger,
        actor: &Actor,
        takedown_request_id: Option<String>,
        policy_version: Option<u64>,
    ) -> WardenResult<Case> {
        self.commit(case, trigger, actor, takedown_request_id, policy_version, None)
    }

    /// Swap the case and store its final request in one write.
    fn resolve(
        &self,
        case: &Case,
        trigger: Trigger,
        actor: &Actor,
        request: &TakedownRequest,
    ) -> WardenResult<Case> {
        self.commit(case, trigger, actor, None, None, Some(request))
    }

    fn commit(
        &self,
        case: &Case,
        trigger: Trigger,
        actor: &Actor,
        takedown_request_id: Option<String>,
        policy_version: Option<u64>,
        resolving: Option<&TakedownRequest>,
    ) -> WardenResult<Case> {
        let span = warden_observability::transition_span!(case.id, trigger);
        let _entered = span.enter();

        let next = state_machine::apply(&case.id, case.status, trigger)?;
        let transition = CaseTransition {
            case_id: case.id.clone(),
            expected_status: case.status,
            expected_version: case.version,
            next_status: next,
            takedown_request_id,
            policy_version,
            at: Utc::now(),
        };
        let outcome = match resolving {
            Some(request) => self.store.resolve_takedown(&transition, request)?,
            None => self.store.compare_and_swap_status(&transition)?,
        };
        match outcome {
            CasOutcome::Swapped(updated) => {
                self.metrics.record_transition();
                info!(case_id = %case.id, from = %case.status, to = %next, "case transitioned");
                self.emit(
                    &case.id,
                    EventType::StatusChanged,
                    payloads::status_changed(case.status, next, trigger, actor),
                );
                Ok(updated)
            }
            CasOutcome::Conflict(current) => {
                self.metrics.record_conflict();
                Err(TransitionError::ConcurrentModification {
                    case_id: case.id.clone(),
                    expected: case.status,
                    expected_version: case.version,
                    actual: current.status,
                    actual_version: current.version,
                }
                .into())
            }
        }
    }

    /// Publish after a committed change. The change stands even if the
    /// event cannot be recorded.
    fn emit(&self, case_id: &str, event_type: EventType, payload: serde_json::Value) {
        match self.publisher.publish(case_id, event_type, payload) {
            Ok(_) => self.metrics.record_event(),
            Err(e) => warn!(
                case_id,
                event_type = event_type.as_str(),
                error = %e,
                "failed to publish case event"
            ),
        }
    }
}
