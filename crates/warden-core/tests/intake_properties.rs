//! Property tests for intake validation.

use chrono::Utc;
use proptest::prelude::*;

use warden_core::models::*;
use warden_core::WardenError;

fn intake(confidence: Option<f64>, similarity: Option<f64>, platform: &str) -> CaseIntake {
    CaseIntake {
        id: Some("c1".to_string()),
        profile_id: "profile-1".to_string(),
        url: "https://example.com/post/1".to_string(),
        platform: platform.to_string(),
        content_type: ContentType::Video,
        confidence,
        similarity,
        signals: CaseSignals::default(),
        jurisdiction: None,
        detected_at: Utc::now(),
    }
}

fn out_of_range() -> impl Strategy<Value = f64> {
    prop_oneof![
        -1.0e6..-0.0001f64,
        100.0001..1.0e6f64,
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
    ]
}

proptest! {
    #[test]
    fn scores_in_range_are_kept_verbatim(
        confidence in 0.0..=100.0f64,
        similarity in 0.0..=100.0f64,
    ) {
        let case = intake(Some(confidence), Some(similarity), "youtube")
            .into_case(Utc::now())
            .unwrap();
        prop_assert_eq!(case.confidence, confidence);
        prop_assert_eq!(case.similarity, similarity);
        prop_assert_eq!(case.status, CaseStatus::Detected);
        prop_assert_eq!(case.version, 0);
    }

    #[test]
    fn out_of_range_confidence_is_rejected(confidence in out_of_range(), similarity in 0.0..=100.0f64) {
        let result = intake(Some(confidence), Some(similarity), "youtube").into_case(Utc::now());
        prop_assert!(matches!(result, Err(WardenError::ValidationError(_))));
    }

    #[test]
    fn out_of_range_similarity_is_rejected(confidence in 0.0..=100.0f64, similarity in out_of_range()) {
        let result = intake(Some(confidence), Some(similarity), "youtube").into_case(Utc::now());
        prop_assert!(matches!(result, Err(WardenError::ValidationError(_))));
    }

    #[test]
    fn blank_platform_is_rejected(spaces in " {0,8}") {
        let result = intake(Some(50.0), Some(50.0), &spaces).into_case(Utc::now());
        prop_assert!(matches!(result, Err(WardenError::ValidationError(_))));
    }

    #[test]
    fn platform_is_trimmed(name in "[a-z]{1,12}", pad in " {0,4}") {
        let padded = format!("{pad}{name}{pad}");
        let case = intake(Some(50.0), Some(50.0), &padded).into_case(Utc::now()).unwrap();
        prop_assert_eq!(case.platform, name);
    }
}
