use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Timing knobs for the takedown lifecycle.
///
/// The retry *count* and compliance window are policy values; only timing lives here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Timeout of a single dispatch attempt.
    pub dispatch_timeout_ms: u64,
    /// First retry delay; doubles per attempt.
    pub backoff_base_ms: u64,
    /// Ceiling for a single retry delay.
    pub backoff_max_ms: u64,
    /// Interval between scheduled expiry sweeps.
    pub expiry_sweep_interval_secs: u64,
    /// Longest wait for a per-case lock before giving up.
    pub lock_timeout_ms: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            dispatch_timeout_ms: defaults::DEFAULT_DISPATCH_TIMEOUT_MS,
            backoff_base_ms: defaults::DEFAULT_BACKOFF_BASE_MS,
            backoff_max_ms: defaults::DEFAULT_BACKOFF_MAX_MS,
            expiry_sweep_interval_secs: defaults::DEFAULT_EXPIRY_SWEEP_INTERVAL_SECS,
            lock_timeout_ms: defaults::DEFAULT_LOCK_TIMEOUT_MS,
        }
    }
}

impl LifecycleConfig {
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn expiry_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.expiry_sweep_interval_secs.max(1))
    }
}
