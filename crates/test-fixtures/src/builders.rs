use chrono::{DateTime, TimeZone, Utc};

use warden_core::models::*;

/// A fixed instant so tests that care about time are reproducible.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Valid scanner intake with the given id and confidence.
pub fn make_intake(id: &str, confidence: f64) -> CaseIntake {
    CaseIntake {
        id: Some(id.to_string()),
        profile_id: "profile-1".to_string(),
        url: format!("https://video.example/watch/{id}"),
        platform: "youtube".to_string(),
        content_type: ContentType::Video,
        confidence: Some(confidence),
        similarity: Some(confidence),
        signals: CaseSignals {
            estimated_impact: EstimatedImpact::High,
            platform_reach: 0,
            profile_importance: 5,
        },
        jurisdiction: None,
        detected_at: Utc::now(),
    }
}

/// A `Detected` case with an explicit priority, bypassing the scorer.
pub fn make_case(id: &str, confidence: f64, priority: PriorityClass) -> Case {
    let now = Utc::now();
    let rank = match priority {
        PriorityClass::Critical => 90.0,
        PriorityClass::High => 70.0,
        PriorityClass::Medium => 50.0,
        PriorityClass::Low => 20.0,
    };
    Case {
        id: id.to_string(),
        profile_id: "profile-1".to_string(),
        url: format!("https://video.example/watch/{id}"),
        platform: "youtube".to_string(),
        content_type: ContentType::Video,
        confidence,
        similarity: confidence,
        priority,
        priority_rank: rank,
        status: CaseStatus::Detected,
        signals: CaseSignals::default(),
        jurisdiction: None,
        detected_at: now,
        updated_at: now,
        takedown_request_id: None,
        version: 0,
        decided_policy_version: None,
    }
}

pub fn make_case_on(id: &str, platform: &str, confidence: f64, priority: PriorityClass) -> Case {
    let mut case = make_case(id, confidence, priority);
    case.platform = platform.to_string();
    case
}

pub fn make_policy_version(version: u64, policy: AutomationPolicy) -> PolicyVersion {
    PolicyVersion {
        version,
        policy,
        created_at: Utc::now(),
    }
}
