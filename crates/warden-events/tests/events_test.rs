//! Publisher tests: sequencing, filtering, overflow policies, replay, and resume.

use std::sync::Arc;

use serde_json::json;

use warden_core::config::{EventsConfig, OverflowPolicy};
use warden_core::models::{CaseEvent, EventType};
use warden_core::traits::IEventLog;
use warden_events::{Deduplicator, EventPublisher, SubscriptionFilter};
use warden_storage::StorageEngine;

fn make_publisher() -> (EventPublisher, Arc<StorageEngine>) {
    let store = test_fixtures::open_store();
    let log: Arc<dyn IEventLog> = store.clone();
    (EventPublisher::new(log, EventsConfig::default()), store)
}

// ── Sequencing ─────────────────────────────────────────────────────────────

#[test]
fn sequences_are_per_case_and_start_at_one() {
    let (publisher, _) = make_publisher();
    let a1 = publisher.publish("a", EventType::CaseIngested, json!({})).unwrap();
    let a2 = publisher.publish("a", EventType::ActionDecided, json!({})).unwrap();
    let b1 = publisher.publish("b", EventType::CaseIngested, json!({})).unwrap();
    assert_eq!((a1.sequence, a2.sequence, b1.sequence), (1, 2, 1));
    assert_eq!(publisher.last_sequence("a").unwrap(), 2);
}

#[test]
fn events_are_persisted_before_delivery() {
    let (publisher, store) = make_publisher();
    let mut sub = publisher.subscribe(SubscriptionFilter::All);
    publisher
        .publish("a", EventType::StatusChanged, json!({ "to": "verified" }))
        .unwrap();
    let delivered = sub.try_recv().expect("delivered");
    let stored = store.events_since("a", 0).unwrap();
    assert_eq!(stored, vec![delivered]);
}

#[test]
fn sequence_resumes_from_log_after_restart() {
    let store = test_fixtures::open_store();
    {
        let publisher = EventPublisher::new(store.clone(), EventsConfig::default());
        for _ in 0..3 {
            publisher.publish("a", EventType::StatusChanged, json!({})).unwrap();
        }
    }
    let publisher = EventPublisher::new(store.clone(), EventsConfig::default());
    let next = publisher.publish("a", EventType::StatusChanged, json!({})).unwrap();
    assert_eq!(next.sequence, 4);
}

#[test]
fn forgotten_case_resumes_from_the_log() {
    let (publisher, _) = make_publisher();
    for _ in 0..3 {
        publisher.publish("a", EventType::StatusChanged, json!({})).unwrap();
    }
    publisher.publish("b", EventType::CaseIngested, json!({})).unwrap();
    assert_eq!(publisher.tracked_cases(), 2);

    publisher.forget("a");
    publisher.forget("unknown");
    assert_eq!(publisher.tracked_cases(), 1);

    let next = publisher.publish("a", EventType::TakedownResolved, json!({})).unwrap();
    assert_eq!(next.sequence, 4);
}

#[tokio::test]
async fn concurrent_publishers_keep_per_case_order() {
    let (publisher, _) = make_publisher();
    let publisher = Arc::new(publisher);
    let mut sub = publisher.subscribe(SubscriptionFilter::Case("hot".to_string()));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let publisher = Arc::clone(&publisher);
        handles.push(tokio::task::spawn_blocking(move || {
            for _ in 0..25 {
                publisher
                    .publish("hot", EventType::StatusChanged, json!({}))
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let sequences: Vec<u64> = sub.drain().into_iter().map(|e| e.sequence).collect();
    assert_eq!(sequences, (1..=200).collect::<Vec<_>>());
}

// ── Subscriptions ──────────────────────────────────────────────────────────

#[tokio::test]
async fn case_filter_only_sees_its_case() {
    let (publisher, _) = make_publisher();
    let mut only_b = publisher.subscribe(SubscriptionFilter::Case("b".to_string()));
    let mut all = publisher.subscribe(SubscriptionFilter::All);

    publisher.publish("a", EventType::CaseIngested, json!({})).unwrap();
    publisher.publish("b", EventType::CaseIngested, json!({})).unwrap();

    let got = only_b.recv().await.unwrap();
    assert_eq!(got.case_id, "b");
    assert!(only_b.try_recv().is_none());
    assert_eq!(all.drain().len(), 2);
}

#[test]
fn drop_newest_marks_subscriber_lagged_without_blocking_others() {
    let (publisher, _) = make_publisher();
    let mut slow = publisher.subscribe_with(SubscriptionFilter::All, 2, OverflowPolicy::DropNewest);
    let mut fast = publisher.subscribe_with(SubscriptionFilter::All, 100, OverflowPolicy::DropNewest);

    for _ in 0..5 {
        publisher.publish("a", EventType::StatusChanged, json!({})).unwrap();
    }

    assert!(slow.is_lagged());
    assert!(!fast.is_lagged());
    let slow_seen: Vec<u64> = slow.drain().into_iter().map(|e| e.sequence).collect();
    assert_eq!(slow_seen, vec![1, 2]);
    assert_eq!(fast.drain().len(), 5);
    assert_eq!(publisher.dropped_events(), 3);

    // Catch up through replay, then clear the flag.
    let missed = publisher.replay("a", 2).unwrap();
    assert_eq!(missed.iter().map(|e| e.sequence).collect::<Vec<_>>(), vec![3, 4, 5]);
    assert!(slow.clear_lagged());
    assert!(!slow.is_lagged());
}

#[tokio::test]
async fn disconnect_policy_removes_subscriber() {
    let (publisher, _) = make_publisher();
    let mut sub = publisher.subscribe_with(SubscriptionFilter::All, 1, OverflowPolicy::Disconnect);
    assert_eq!(publisher.subscriber_count(), 1);

    publisher.publish("a", EventType::StatusChanged, json!({})).unwrap();
    publisher.publish("a", EventType::StatusChanged, json!({})).unwrap();

    assert_eq!(publisher.subscriber_count(), 0);
    assert_eq!(sub.recv().await.map(|e| e.sequence), Some(1));
    assert!(sub.recv().await.is_none());
}

#[test]
fn dropped_receivers_are_pruned() {
    let (publisher, _) = make_publisher();
    let sub = publisher.subscribe(SubscriptionFilter::All);
    drop(sub);
    publisher.publish("a", EventType::CaseIngested, json!({})).unwrap();
    assert_eq!(publisher.subscriber_count(), 0);
}

#[test]
fn unsubscribe_stops_delivery() {
    let (publisher, _) = make_publisher();
    let mut sub = publisher.subscribe(SubscriptionFilter::All);
    assert!(publisher.unsubscribe(sub.id()));
    assert!(!publisher.unsubscribe(sub.id()));
    publisher.publish("a", EventType::CaseIngested, json!({})).unwrap();
    assert!(sub.try_recv().is_none());
}

// ── De-duplication ─────────────────────────────────────────────────────────

#[test]
fn deduplicator_discards_redeliveries() {
    let (publisher, _) = make_publisher();
    let mut sub = publisher.subscribe(SubscriptionFilter::All);
    for _ in 0..3 {
        publisher.publish("a", EventType::StatusChanged, json!({})).unwrap();
    }

    let mut dedup = Deduplicator::new();
    let live = dedup.filter(sub.drain());
    assert_eq!(live.len(), 3);

    // A replay from the start redelivers everything already seen.
    let replayed: Vec<CaseEvent> = publisher.replay("a", 0).unwrap();
    assert!(dedup.filter(replayed).is_empty());
    assert_eq!(dedup.last_seen("a"), 3);
}
