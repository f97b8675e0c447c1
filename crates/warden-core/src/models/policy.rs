//! Automation policy: thresholds, overrides, deadlines, retry bounds.
//!
//! # Examples
//!
//! ```
//! use warden_core::models::AutomationPolicy;
//!
//! let policy = AutomationPolicy::default();
//! assert_eq!(policy.auto_approve_threshold, 85.0);
//! assert_eq!(policy.auto_reject_threshold, 20.0);
//! assert_eq!(policy.compliance_window_days, 14);
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::defaults;

/// Which settings a user may edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    /// Only thresholds and batching preferences are editable.
    #[default]
    Basic,
    /// Every setting is editable.
    Advanced,
}

/// Platform-specific policy fragment. Set fields win over the global values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct PlatformOverride {
    pub auto_approve_threshold: Option<f64>,
    pub auto_reject_threshold: Option<f64>,
    pub compliance_window_days: Option<u32>,
    /// Disable automation for the platform: every case goes to manual review.
    pub force_manual_review: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct BatchingPreferences {
    /// Concurrency used when a batch request does not name one.
    pub default_concurrency: usize,
    /// Order batch items so cases on the same platform run together.
    pub group_by_platform: bool,
}

impl Default for BatchingPreferences {
    fn default() -> Self {
        Self {
            default_concurrency: defaults::DEFAULT_BATCH_CONCURRENCY,
            group_by_platform: false,
        }
    }
}

/// The automation policy. Immutable once published inside a [`PolicyVersion`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct AutomationPolicy {
    /// Confidence at or above which non-low cases are approved automatically.
    pub auto_approve_threshold: f64,
    /// Confidence at or below which cases are rejected as false positives.
    pub auto_reject_threshold: f64,
    /// Keyed by normalized platform name.
    pub platform_overrides: BTreeMap<String, PlatformOverride>,
    /// Legal window between delivery and the compliance deadline.
    pub compliance_window_days: u32,
    /// Keyed by jurisdiction code (e.g. `us`, `eu`).
    pub jurisdiction_windows: BTreeMap<String, u32>,
    /// Retries after the first failed dispatch attempt.
    pub max_dispatch_retries: u32,
    /// Dispatch a takedown right after an approval.
    pub auto_dispatch: bool,
    pub batching: BatchingPreferences,
    pub complexity: ComplexityLevel,
}

impl Default for AutomationPolicy {
    fn default() -> Self {
        Self {
            auto_approve_threshold: defaults::DEFAULT_AUTO_APPROVE_THRESHOLD,
            auto_reject_threshold: defaults::DEFAULT_AUTO_REJECT_THRESHOLD,
            platform_overrides: BTreeMap::new(),
            compliance_window_days: defaults::DEFAULT_COMPLIANCE_WINDOW_DAYS,
            jurisdiction_windows: BTreeMap::new(),
            max_dispatch_retries: defaults::DEFAULT_MAX_DISPATCH_RETRIES,
            auto_dispatch: true,
            batching: BatchingPreferences::default(),
            complexity: ComplexityLevel::Basic,
        }
    }
}

impl AutomationPolicy {
    /// Look up the override for a platform, matching case-insensitively.
    pub fn override_for(&self, platform: &str) -> Option<&PlatformOverride> {
        self.platform_overrides.get(&normalize_platform(platform))
    }

    /// Compliance window in days.
    ///
    /// Precedence: platform override, then jurisdiction, then the global window.
    pub fn compliance_window_for(&self, platform: &str, jurisdiction: Option<&str>) -> u32 {
        if let Some(days) = self
            .override_for(platform)
            .and_then(|o| o.compliance_window_days)
        {
            return days;
        }
        jurisdiction
            .and_then(|j| self.jurisdiction_windows.get(&j.trim().to_ascii_lowercase()))
            .copied()
            .unwrap_or(self.compliance_window_days)
    }

    /// Copy with override and jurisdiction keys normalized.
    pub fn normalized(mut self) -> Self {
        self.platform_overrides = std::mem::take(&mut self.platform_overrides)
            .into_iter()
            .map(|(k, v)| (normalize_platform(&k), v))
            .collect();
        self.jurisdiction_windows = std::mem::take(&mut self.jurisdiction_windows)
            .into_iter()
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v))
            .collect();
        self
    }
}

/// Canonical form of a platform name used as the override key.
pub fn normalize_platform(platform: &str) -> String {
    platform.trim().to_ascii_lowercase()
}

/// A published, immutable policy together with its version number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PolicyVersion {
    pub version: u64,
    pub policy: AutomationPolicy,
    pub created_at: DateTime<Utc>,
}

/// Partial policy update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyPatch {
    pub auto_approve_threshold: Option<f64>,
    pub auto_reject_threshold: Option<f64>,
    pub batching: Option<BatchingPreferences>,
    /// Replaces the whole override table. Advanced only.
    pub platform_overrides: Option<BTreeMap<String, PlatformOverride>>,
    /// Advanced only.
    pub compliance_window_days: Option<u32>,
    /// Advanced only.
    pub jurisdiction_windows: Option<BTreeMap<String, u32>>,
    /// Advanced only.
    pub max_dispatch_retries: Option<u32>,
    /// Advanced only.
    pub auto_dispatch: Option<bool>,
    pub complexity: Option<ComplexityLevel>,
}

impl PolicyPatch {
    /// Names of the advanced-only fields this patch touches.
    pub fn advanced_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.platform_overrides.is_some() {
            fields.push("platform_overrides");
        }
        if self.compliance_window_days.is_some() {
            fields.push("compliance_window_days");
        }
        if self.jurisdiction_windows.is_some() {
            fields.push("jurisdiction_windows");
        }
        if self.max_dispatch_retries.is_some() {
            fields.push("max_dispatch_retries");
        }
        if self.auto_dispatch.is_some() {
            fields.push("auto_dispatch");
        }
        fields
    }

    /// Apply onto a base policy. Gating is the caller's job.
    pub fn apply_to(&self, base: &AutomationPolicy) -> AutomationPolicy {
        let mut next = base.clone();
        if let Some(v) = self.auto_approve_threshold {
            next.auto_approve_threshold = v;
        }
        if let Some(v) = self.auto_reject_threshold {
            next.auto_reject_threshold = v;
        }
        if let Some(v) = &self.batching {
            next.batching = v.clone();
        }
        if let Some(v) = &self.platform_overrides {
            next.platform_overrides = v.clone();
        }
        if let Some(v) = self.compliance_window_days {
            next.compliance_window_days = v;
        }
        if let Some(v) = &self.jurisdiction_windows {
            next.jurisdiction_windows = v.clone();
        }
        if let Some(v) = self.max_dispatch_retries {
            next.max_dispatch_retries = v;
        }
        if let Some(v) = self.auto_dispatch {
            next.auto_dispatch = v;
        }
        if let Some(v) = self.complexity {
            next.complexity = v;
        }
        next
    }
}
