use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::errors::WardenError;

/// Status of a takedown notice sent to a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TakedownStatus {
    /// Created and handed to the dispatcher, delivery not yet confirmed.
    Pending,
    /// Delivered; the compliance deadline is running.
    Sent,
    /// The platform confirmed receipt.
    Acknowledged,
    Complied,
    Rejected,
    Expired,
}

impl TakedownStatus {
    /// Active requests block a second request for the same case.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            TakedownStatus::Pending | TakedownStatus::Sent | TakedownStatus::Acknowledged
        )
    }

    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }

    /// Whether the request lifecycle permits moving to `next`.
    pub fn can_transition_to(self, next: TakedownStatus) -> bool {
        use TakedownStatus::*;
        matches!(
            (self, next),
            (Pending, Sent)
                | (Pending, Rejected)
                | (Sent, Acknowledged)
                | (Sent, Complied)
                | (Sent, Rejected)
                | (Sent, Expired)
                | (Acknowledged, Complied)
                | (Acknowledged, Rejected)
                | (Acknowledged, Expired)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TakedownStatus::Pending => "pending",
            TakedownStatus::Sent => "sent",
            TakedownStatus::Acknowledged => "acknowledged",
            TakedownStatus::Complied => "complied",
            TakedownStatus::Rejected => "rejected",
            TakedownStatus::Expired => "expired",
        }
    }
}

impl FromStr for TakedownStatus {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TakedownStatus::Pending),
            "sent" => Ok(TakedownStatus::Sent),
            "acknowledged" => Ok(TakedownStatus::Acknowledged),
            "complied" => Ok(TakedownStatus::Complied),
            "rejected" => Ok(TakedownStatus::Rejected),
            "expired" => Ok(TakedownStatus::Expired),
            other => Err(WardenError::ValidationError(format!(
                "unknown takedown status: {other}"
            ))),
        }
    }
}

impl fmt::Display for TakedownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A regulated notice asking a platform to remove content.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TakedownRequest {
    pub id: String,
    pub case_id: String,
    /// Recipient platform.
    pub platform: String,
    pub status: TakedownStatus,
    /// Stable key passed to the dispatcher on every attempt.
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub responded_at: Option<DateTime<Utc>>,
    pub compliance_deadline: Option<DateTime<Utc>>,
    /// Number of failed dispatch attempts.
    pub retry_count: u32,
    pub last_error: Option<String>,
    /// Policy version whose window and retry bound apply.
    pub policy_version: u64,
}

impl TakedownRequest {
    /// Create a pending request for a case.
    pub fn new(case_id: &str, platform: &str, policy_version: u64, now: DateTime<Utc>) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        let idempotency_key = Self::idempotency_key(case_id, &id);
        Self {
            id,
            case_id: case_id.to_string(),
            platform: platform.to_string(),
            status: TakedownStatus::Pending,
            idempotency_key,
            created_at: now,
            sent_at: None,
            acknowledged_at: None,
            responded_at: None,
            compliance_deadline: None,
            retry_count: 0,
            last_error: None,
            policy_version,
        }
    }

    /// blake3 over `case_id || request_id`, hex encoded.
    pub fn idempotency_key(case_id: &str, request_id: &str) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(case_id.as_bytes());
        hasher.update(b"\x00");
        hasher.update(request_id.as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    /// Record delivery and start the compliance clock.
    pub fn mark_sent(&mut self, at: DateTime<Utc>, window_days: u32) {
        self.status = TakedownStatus::Sent;
        self.sent_at = Some(at);
        self.compliance_deadline = Some(at + Duration::days(i64::from(window_days)));
    }

    /// Delivered, unanswered, and past its deadline.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        matches!(
            self.status,
            TakedownStatus::Sent | TakedownStatus::Acknowledged
        ) && self.compliance_deadline.is_some_and(|deadline| now > deadline)
    }
}
