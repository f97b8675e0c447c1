use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use warden_core::models::*;
use warden_scoring::ScoringEngine;

fn make_case(i: u64) -> Case {
    let now = Utc::now();
    Case {
        id: format!("case-{i}"),
        profile_id: format!("profile-{}", i % 50),
        url: format!("https://example.com/{i}"),
        platform: "youtube".to_string(),
        content_type: ContentType::Image,
        confidence: (i % 101) as f64,
        similarity: 80.0,
        priority: PriorityClass::Low,
        priority_rank: 0.0,
        status: CaseStatus::Detected,
        signals: CaseSignals {
            estimated_impact: match i % 3 {
                0 => EstimatedImpact::Low,
                1 => EstimatedImpact::Medium,
                _ => EstimatedImpact::High,
            },
            platform_reach: i * 997,
            profile_importance: (i % 10) as u8 + 1,
        },
        jurisdiction: None,
        detected_at: now - Duration::minutes((i % 2000) as i64),
        updated_at: now,
        takedown_request_id: None,
        version: 0,
        decided_policy_version: None,
    }
}

fn bench_score_single(c: &mut Criterion) {
    let engine = ScoringEngine::default();
    let case = make_case(42);
    let now = Utc::now();
    c.bench_function("score_single_case", |b| {
        b.iter(|| engine.score(black_box(&case), now))
    });
}

fn bench_rank_queue_10k(c: &mut Criterion) {
    let engine = ScoringEngine::default();
    let cases: Vec<Case> = (0..10_000).map(make_case).collect();
    let now = Utc::now();
    c.bench_function("rank_queue_10k", |b| {
        b.iter(|| engine.rank_queue(black_box(cases.clone()), now))
    });
}

criterion_group!(benches, bench_score_single, bench_rank_queue_10k);
criterion_main!(benches);
