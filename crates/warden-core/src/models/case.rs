use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::constants::{CRITICAL_RANK, HIGH_RANK, MEDIUM_RANK, SCORE_MAX, SCORE_MIN};
use crate::errors::{WardenError, WardenResult};

/// Kind of content the scanner matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Image,
    Video,
    Text,
    Audio,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Image => "image",
            ContentType::Video => "video",
            ContentType::Text => "text",
            ContentType::Audio => "audio",
        }
    }
}

impl FromStr for ContentType {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(ContentType::Image),
            "video" => Ok(ContentType::Video),
            "text" => Ok(ContentType::Text),
            "audio" => Ok(ContentType::Audio),
            other => Err(WardenError::ValidationError(format!(
                "unknown content type: {other}"
            ))),
        }
    }
}

/// Priority bucket derived from the rank. Ordered `Low < Medium < High < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PriorityClass {
    Low,
    Medium,
    High,
    Critical,
}

impl PriorityClass {
    /// Map a rank in [0, 100] to its class.
    pub fn from_rank(rank: f64) -> Self {
        if rank >= CRITICAL_RANK {
            PriorityClass::Critical
        } else if rank >= HIGH_RANK {
            PriorityClass::High
        } else if rank >= MEDIUM_RANK {
            PriorityClass::Medium
        } else {
            PriorityClass::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PriorityClass::Low => "low",
            PriorityClass::Medium => "medium",
            PriorityClass::High => "high",
            PriorityClass::Critical => "critical",
        }
    }
}

impl FromStr for PriorityClass {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(PriorityClass::Low),
            "medium" => Ok(PriorityClass::Medium),
            "high" => Ok(PriorityClass::High),
            "critical" => Ok(PriorityClass::Critical),
            other => Err(WardenError::ValidationError(format!(
                "unknown priority class: {other}"
            ))),
        }
    }
}

impl fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estimated harm if the content stays up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EstimatedImpact {
    Low,
    #[default]
    Medium,
    High,
}

/// Lifecycle status of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Detected,
    Verified,
    TakedownSent,
    Removed,
    Rejected,
    Expired,
    FalsePositive,
}

impl CaseStatus {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CaseStatus::Removed
                | CaseStatus::Rejected
                | CaseStatus::Expired
                | CaseStatus::FalsePositive
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CaseStatus::Detected => "detected",
            CaseStatus::Verified => "verified",
            CaseStatus::TakedownSent => "takedown_sent",
            CaseStatus::Removed => "removed",
            CaseStatus::Rejected => "rejected",
            CaseStatus::Expired => "expired",
            CaseStatus::FalsePositive => "false_positive",
        }
    }
}

impl FromStr for CaseStatus {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "detected" => Ok(CaseStatus::Detected),
            "verified" => Ok(CaseStatus::Verified),
            "takedown_sent" => Ok(CaseStatus::TakedownSent),
            "removed" => Ok(CaseStatus::Removed),
            "rejected" => Ok(CaseStatus::Rejected),
            "expired" => Ok(CaseStatus::Expired),
            "false_positive" => Ok(CaseStatus::FalsePositive),
            other => Err(WardenError::ValidationError(format!(
                "unknown case status: {other}"
            ))),
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw scoring inputs supplied alongside the scanner's scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct CaseSignals {
    pub estimated_impact: EstimatedImpact,
    /// Estimated view count on the hosting platform.
    pub platform_reach: u64,
    /// Importance of the protected profile, 1-10.
    pub profile_importance: u8,
}

impl Default for CaseSignals {
    fn default() -> Self {
        Self {
            estimated_impact: EstimatedImpact::Medium,
            platform_reach: 0,
            profile_importance: 5,
        }
    }
}

/// A single detected potential infringement under triage.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Case {
    /// UUID v4 identifier.
    pub id: String,
    pub profile_id: String,
    pub url: String,
    pub platform: String,
    pub content_type: ContentType,
    /// Scanner confidence, 0-100. Never modified by the engine.
    pub confidence: f64,
    /// Scanner similarity, 0-100. Never modified by the engine.
    pub similarity: f64,
    pub priority: PriorityClass,
    pub priority_rank: f64,
    pub status: CaseStatus,
    pub signals: CaseSignals,
    /// Jurisdiction used to pick the compliance window, if known.
    pub jurisdiction: Option<String>,
    pub detected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub takedown_request_id: Option<String>,
    /// Optimistic-concurrency counter, bumped by the store on every status swap.
    pub version: u64,
    /// Policy version behind the last automated decision.
    pub decided_policy_version: Option<u64>,
}

/// Identity equality: two cases are equal if they have the same ID.
impl PartialEq for Case {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// A case record as delivered by the scanner feed, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseIntake {
    /// Scanner-assigned id. A fresh UUID is generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub profile_id: String,
    pub url: String,
    pub platform: String,
    pub content_type: ContentType,
    pub confidence: Option<f64>,
    pub similarity: Option<f64>,
    #[serde(default)]
    pub signals: CaseSignals,
    #[serde(default)]
    pub jurisdiction: Option<String>,
    pub detected_at: DateTime<Utc>,
}

impl CaseIntake {
    /// Validate the intake record and turn it into a `Detected` case.
    ///
    /// Priority fields are left at `Low`/0 until the scorer runs.
    pub fn into_case(self, now: DateTime<Utc>) -> WardenResult<Case> {
        let confidence = require_score("confidence", self.confidence)?;
        let similarity = require_score("similarity", self.similarity)?;
        require_non_empty("profile_id", &self.profile_id)?;
        require_non_empty("url", &self.url)?;
        require_non_empty("platform", &self.platform)?;

        Ok(Case {
            id: self
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            profile_id: self.profile_id,
            url: self.url,
            platform: self.platform.trim().to_string(),
            content_type: self.content_type,
            confidence,
            similarity,
            priority: PriorityClass::Low,
            priority_rank: 0.0,
            status: CaseStatus::Detected,
            signals: self.signals,
            jurisdiction: self.jurisdiction,
            detected_at: self.detected_at,
            updated_at: now,
            takedown_request_id: None,
            version: 0,
            decided_policy_version: None,
        })
    }
}

fn require_score(name: &str, value: Option<f64>) -> WardenResult<f64> {
    let value =
        value.ok_or_else(|| WardenError::ValidationError(format!("missing {name}")))?;
    if !value.is_finite() || !(SCORE_MIN..=SCORE_MAX).contains(&value) {
        return Err(WardenError::ValidationError(format!(
            "{name} {value} is outside {SCORE_MIN}..={SCORE_MAX}"
        )));
    }
    Ok(value)
}

fn require_non_empty(name: &str, value: &str) -> WardenResult<()> {
    if value.trim().is_empty() {
        return Err(WardenError::ValidationError(format!("{name} is empty")));
    }
    Ok(())
}

/// Store query filter. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    pub statuses: Vec<CaseStatus>,
    pub platform: Option<String>,
    pub profile_id: Option<String>,
    pub min_priority: Option<PriorityClass>,
    pub limit: Option<usize>,
}

impl CaseFilter {
    pub fn with_status(status: CaseStatus) -> Self {
        Self {
            statuses: vec![status],
            ..Default::default()
        }
    }

    /// In-memory evaluation of the filter, used by stores without native queries.
    pub fn matches(&self, case: &Case) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&case.status))
            && self
                .platform
                .as_ref()
                .map_or(true, |p| p.eq_ignore_ascii_case(&case.platform))
            && self
                .profile_id
                .as_ref()
                .map_or(true, |p| *p == case.profile_id)
            && self.min_priority.map_or(true, |min| case.priority >= min)
    }
}
