//! End-to-end scenarios through the TriageEngine facade.

use std::time::Duration;

use chrono::Utc;

use test_fixtures::{make_case_on, make_intake, ScriptedDispatcher};
use warden::{Cancellable, CancellationToken, SubscriptionFilter, TriageEngine};
use warden_core::config::{LifecycleConfig, WardenConfig};
use warden_core::errors::WardenError;
use warden_core::models::*;
use warden_core::traits::ICaseStore;

fn config() -> WardenConfig {
    WardenConfig {
        lifecycle: LifecycleConfig {
            dispatch_timeout_ms: 500,
            backoff_base_ms: 1,
            backoff_max_ms: 5,
            expiry_sweep_interval_secs: 1,
            lock_timeout_ms: 2_000,
        },
        ..Default::default()
    }
}

fn engine() -> TriageEngine<ScriptedDispatcher> {
    TriageEngine::in_memory(config(), ScriptedDispatcher::succeeding()).unwrap()
}

fn reviewer() -> Actor {
    Actor::Reviewer {
        reviewer_id: "rev-1".to_string(),
    }
}

// ── Ingest ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn high_confidence_case_is_approved_and_dispatched() {
    let engine = engine();
    let before = Utc::now();
    let outcome = engine.ingest(make_intake("c1", 95.0)).await.unwrap();

    assert_eq!(outcome.decision.action, Action::AutoApprove);
    assert_eq!(outcome.decision.policy_version, 1);
    assert_eq!(outcome.case.priority, PriorityClass::High);
    assert_eq!(outcome.case.status, CaseStatus::TakedownSent);
    assert_eq!(outcome.case.decided_policy_version, Some(1));
    assert!(outcome.dispatch_error.is_none());

    let request = outcome.takedown.expect("takedown dispatched");
    assert_eq!(request.status, TakedownStatus::Sent);
    let deadline = request.compliance_deadline.unwrap();
    assert_eq!(deadline, request.sent_at.unwrap() + chrono::Duration::days(14));
    assert!(deadline >= before + chrono::Duration::days(14));
    assert!(deadline <= Utc::now() + chrono::Duration::days(14));
}

#[tokio::test]
async fn band_case_waits_for_review_untouched() {
    let engine = engine();
    let outcome = engine.ingest(make_intake("c1", 40.0)).await.unwrap();

    assert_eq!(outcome.decision.action, Action::ManualReview);
    assert_eq!(outcome.decision.approve_threshold, 85.0);
    assert_eq!(outcome.decision.reject_threshold, 20.0);
    assert_eq!(outcome.case.status, CaseStatus::Detected);
    assert_eq!(outcome.case.version, 0);
    assert!(outcome.takedown.is_none());

    let types: Vec<EventType> = engine
        .replay("c1", 0)
        .unwrap()
        .into_iter()
        .map(|e| e.event_type)
        .collect();
    assert_eq!(types, vec![EventType::CaseIngested, EventType::ActionDecided]);
}

#[tokio::test]
async fn low_confidence_case_is_rejected_as_false_positive() {
    let engine = engine();
    let outcome = engine.ingest(make_intake("c1", 10.0)).await.unwrap();
    assert_eq!(outcome.decision.action, Action::AutoReject);
    assert_eq!(outcome.case.status, CaseStatus::FalsePositive);
}

#[tokio::test]
async fn approval_without_auto_dispatch_stops_at_verified() {
    let mut config = config();
    config.policy.auto_dispatch = false;
    let engine = TriageEngine::in_memory(config, ScriptedDispatcher::succeeding()).unwrap();
    let outcome = engine.ingest(make_intake("c1", 95.0)).await.unwrap();
    assert_eq!(outcome.case.status, CaseStatus::Verified);
    assert!(outcome.takedown.is_none());
}

#[tokio::test]
async fn failed_auto_dispatch_is_reported_on_the_outcome() {
    let mut config = config();
    config.policy.max_dispatch_retries = 1;
    let engine = TriageEngine::in_memory(config, ScriptedDispatcher::failing()).unwrap();
    let outcome = engine.ingest(make_intake("c1", 95.0)).await.unwrap();

    assert_eq!(outcome.decision.action, Action::AutoApprove);
    assert!(outcome.dispatch_error.unwrap().contains("retries exhausted"));
    assert_eq!(outcome.case.status, CaseStatus::Rejected);
}

#[tokio::test]
async fn invalid_intake_is_rejected_before_storage() {
    let engine = engine();
    let mut intake = make_intake("c1", 95.0);
    intake.confidence = None;
    let err = engine.ingest(intake).await.unwrap_err();
    assert!(matches!(err, WardenError::ValidationError(_)));
    assert!(matches!(engine.case("c1"), Err(WardenError::CaseNotFound { .. })));

    let mut intake = make_intake("c2", 95.0);
    intake.similarity = Some(140.0);
    assert!(engine.ingest(intake).await.is_err());
    assert_eq!(engine.metrics().cases_ingested, 0);
}

#[tokio::test]
async fn redelivered_intake_is_refused() {
    let engine = engine();
    engine.ingest(make_intake("c1", 40.0)).await.unwrap();
    let err = engine.ingest(make_intake("c1", 95.0)).await.unwrap_err();
    assert!(matches!(err, WardenError::ValidationError(_)));
    assert_eq!(engine.case("c1").unwrap().confidence, 40.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicate_intake_keeps_the_first_case() {
    let engine = std::sync::Arc::new(engine());
    let mut tasks = Vec::new();
    for jurisdiction in ["eu", "us", "uk", "br"] {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            let mut intake = make_intake("c1", 40.0);
            intake.jurisdiction = Some(jurisdiction.to_string());
            engine.ingest(intake).await.map(|o| o.case.jurisdiction)
        }));
    }
    let mut winners = Vec::new();
    for task in tasks {
        match task.await.unwrap() {
            Ok(jurisdiction) => winners.push(jurisdiction),
            Err(e) => assert!(matches!(e, WardenError::ValidationError(_))),
        }
    }
    assert_eq!(winners.len(), 1);
    assert_eq!(engine.case("c1").unwrap().jurisdiction, winners[0]);
    assert_eq!(engine.metrics().cases_ingested, 1);
}

#[tokio::test]
async fn subscribers_see_the_whole_flow_in_order() {
    let engine = engine();
    let mut sub = engine.subscribe(SubscriptionFilter::Case("c1".to_string()));
    engine.ingest(make_intake("c1", 95.0)).await.unwrap();
    engine.ingest(make_intake("c2", 95.0)).await.unwrap();

    let events = sub.drain();
    let types: Vec<EventType> = events.iter().map(|e| e.event_type).collect();
    assert_eq!(
        types,
        vec![
            EventType::CaseIngested,
            EventType::ActionDecided,
            EventType::StatusChanged,
            EventType::StatusChanged,
            EventType::TakedownCreated,
            EventType::TakedownDelivered,
        ]
    );
    assert!(events.iter().all(|e| e.case_id == "c1"));
    assert!(events.windows(2).all(|w| w[1].sequence == w[0].sequence + 1));
}

// ── Decisions & policy ─────────────────────────────────────────────────────

#[tokio::test]
async fn preview_neither_mutates_nor_emits() {
    let engine = engine();
    engine.ingest(make_intake("c1", 40.0)).await.unwrap();
    let events_before = engine.replay("c1", 0).unwrap().len();

    let preview = engine.preview("c1").unwrap();
    assert_eq!(preview.decision.action, Action::ManualReview);
    assert_eq!(preview.breakdown.priority, preview.decision.priority);

    let fresh = engine.preview_intake(make_intake("c9", 95.0)).unwrap();
    assert_eq!(fresh.decision.action, Action::AutoApprove);

    assert_eq!(engine.replay("c1", 0).unwrap().len(), events_before);
    assert!(engine.case("c9").is_err());
    assert_eq!(engine.case("c1").unwrap().version, 0);
}

#[tokio::test]
async fn policy_changes_are_not_retroactive() {
    let engine = engine();
    engine.ingest(make_intake("c1", 40.0)).await.unwrap();

    let mut policy = AutomationPolicy::default();
    policy.auto_approve_threshold = 35.0;
    let v2 = engine.replace_policy(policy).unwrap();
    assert_eq!(v2.version, 2);

    assert_eq!(
        engine.decide_with_version("c1", 1).unwrap().action,
        Action::ManualReview
    );
    let now = engine.decide("c1").unwrap();
    assert_eq!((now.action, now.policy_version), (Action::AutoApprove, 2));
    assert_eq!(engine.case("c1").unwrap().status, CaseStatus::Detected);
}

#[tokio::test]
async fn basic_policy_refuses_advanced_patch() {
    let engine = engine();
    let patch = PolicyPatch {
        max_dispatch_retries: Some(9),
        ..Default::default()
    };
    let err = engine.patch_policy(&patch).unwrap_err();
    assert!(matches!(
        err,
        WardenError::PolicyError(warden_core::errors::PolicyError::SettingLocked { .. })
    ));
    assert_eq!(engine.policy().version, 1);
}

// ── Manual review & signals ────────────────────────────────────────────────

#[tokio::test]
async fn reviewer_approval_dispatches_and_signal_closes_case() {
    let engine = engine();
    engine.ingest(make_intake("c1", 60.0)).await.unwrap();

    let approval = engine.approve("c1", &reviewer()).await.unwrap();
    assert_eq!(approval.case.status, CaseStatus::TakedownSent);
    let request = approval.takedown.unwrap();

    engine
        .handle_signal(&ComplianceSignal {
            request_id: request.id.clone(),
            kind: SignalKind::Removed,
            received_at: Utc::now(),
        })
        .await
        .unwrap();
    assert_eq!(engine.case("c1").unwrap().status, CaseStatus::Removed);
    assert_eq!(
        engine.takedown(&request.id).unwrap().unwrap().status,
        TakedownStatus::Complied
    );
}

#[tokio::test]
async fn sweep_through_facade_expires_overdue_case() {
    let engine = engine();
    let request = engine
        .ingest(make_intake("c1", 95.0))
        .await
        .unwrap()
        .takedown
        .unwrap();
    let later = request.compliance_deadline.unwrap() + chrono::Duration::hours(1);
    let report = engine.run_expiry_sweep(later).await.unwrap();
    assert_eq!(report.expired, 1);
    assert_eq!(engine.case("c1").unwrap().status, CaseStatus::Expired);
    assert_eq!(engine.metrics().takedowns_expired, 1);
}

#[tokio::test]
async fn expiry_scheduler_stops_when_cancelled() {
    let engine = engine();
    let stop = CancellationToken::new();
    let task = engine.spawn_expiry_scheduler(stop.clone());
    tokio::time::sleep(Duration::from_millis(50)).await;
    stop.cancel();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("scheduler stopped")
        .unwrap();
}

// ── Batches ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn batch_approval_isolates_the_failing_item() {
    let engine = TriageEngine::in_memory(
        config(),
        ScriptedDispatcher::succeeding().with_failing_case("c3"),
    )
    .unwrap();
    let ids: Vec<String> = (0..6).map(|i| format!("c{i}")).collect();
    for id in &ids {
        engine.ingest(make_intake(id, 60.0)).await.unwrap();
    }

    let job = engine
        .submit_batch(BatchAction::Approve, ids.clone(), Some(3))
        .unwrap()
        .wait()
        .await;
    let progress = job.progress();
    assert_eq!((progress.succeeded, progress.failed), (5, 1));
    let failures = job.failures();
    assert_eq!(failures[0].0, "c3");
    assert!(failures[0].1.contains("refused"));

    assert_eq!(engine.case("c0").unwrap().status, CaseStatus::TakedownSent);
    assert_eq!(engine.case("c3").unwrap().status, CaseStatus::Rejected);
    assert_eq!(engine.batch(&job.id).unwrap().status, BatchStatus::Completed);
}

#[tokio::test]
async fn batch_reports_conflicting_state_per_item() {
    let engine = engine();
    engine.ingest(make_intake("ok", 60.0)).await.unwrap();
    engine.ingest(make_intake("done", 10.0)).await.unwrap();

    let job = engine
        .submit_batch(
            BatchAction::RejectFalsePositive,
            vec!["ok".to_string(), "done".to_string(), "ghost".to_string()],
            None,
        )
        .unwrap()
        .wait()
        .await;
    assert_eq!(job.outcomes[0], ItemOutcome::Succeeded);
    match &job.outcomes[1] {
        ItemOutcome::Failed { reason } => assert!(reason.contains("false_positive"), "{reason}"),
        other => panic!("expected failure, got {other:?}"),
    }
    match &job.outcomes[2] {
        ItemOutcome::Failed { reason } => assert!(reason.contains("not found"), "{reason}"),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn batch_triage_decides_stored_cases() {
    let engine = engine();
    let store = engine.store().clone();
    store
        .save(&test_fixtures::make_case("hi", 95.0, PriorityClass::High))
        .unwrap();
    store
        .save(&test_fixtures::make_case("mid", 50.0, PriorityClass::Medium))
        .unwrap();

    let job = engine
        .submit_batch(
            BatchAction::Triage,
            vec!["hi".to_string(), "mid".to_string()],
            Some(2),
        )
        .unwrap()
        .wait()
        .await;
    assert_eq!(job.progress().succeeded, 2);
    assert_eq!(engine.case("hi").unwrap().status, CaseStatus::TakedownSent);
    assert_eq!(engine.case("mid").unwrap().status, CaseStatus::Detected);
}

#[tokio::test]
async fn grouped_batches_run_platforms_together() {
    let mut config = config();
    config.policy.batching.group_by_platform = true;
    let engine = TriageEngine::in_memory(config, ScriptedDispatcher::succeeding()).unwrap();
    let store = engine.store().clone();
    for (id, platform) in [("1", "vimeo"), ("2", "YouTube"), ("3", "vimeo"), ("4", "youtube")] {
        store
            .save(&make_case_on(id, platform, 50.0, PriorityClass::Medium))
            .unwrap();
    }

    let ids = ["1", "2", "3", "4", "missing"].map(String::from).to_vec();
    let handle = engine
        .submit_batch(BatchAction::RejectFalsePositive, ids, Some(1))
        .unwrap();
    let job = handle.wait().await;
    assert_eq!(job.case_ids, vec!["1", "3", "2", "4", "missing"]);
    assert_eq!(job.progress().failed, 1);
}

#[tokio::test]
async fn queue_orders_by_rank() {
    let engine = engine();
    engine.ingest(make_intake("a", 40.0)).await.unwrap();
    engine.ingest(make_intake("b", 70.0)).await.unwrap();
    engine.ingest(make_intake("c", 55.0)).await.unwrap();

    let queue = engine
        .queue(&CaseFilter::with_status(CaseStatus::Detected))
        .unwrap();
    let ids: Vec<&str> = queue.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "c", "a"]);
}

// ── Restart ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config();
    config.storage.db_path = dir.path().join("warden.db").to_string_lossy().into_owned();

    let request_id = {
        let engine = TriageEngine::open(config.clone(), ScriptedDispatcher::succeeding()).unwrap();
        let mut policy = AutomationPolicy::default();
        policy.compliance_window_days = 10;
        policy.complexity = ComplexityLevel::Advanced;
        engine.replace_policy(policy).unwrap();
        engine
            .ingest(make_intake("c1", 95.0))
            .await
            .unwrap()
            .takedown
            .unwrap()
            .id
    };

    let engine = TriageEngine::open(config, ScriptedDispatcher::succeeding()).unwrap();
    assert_eq!(engine.policy().version, 2);
    assert_eq!(engine.case("c1").unwrap().status, CaseStatus::TakedownSent);
    let request = engine.takedown(&request_id).unwrap().unwrap();
    assert_eq!(
        request.compliance_deadline.unwrap(),
        request.sent_at.unwrap() + chrono::Duration::days(10)
    );

    let last = engine.replay("c1", 0).unwrap().last().unwrap().sequence;
    engine
        .handle_signal(&ComplianceSignal {
            request_id,
            kind: SignalKind::Acknowledged,
            received_at: Utc::now(),
        })
        .await
        .unwrap();
    assert_eq!(engine.replay("c1", last).unwrap()[0].sequence, last + 1);
}
