//! Default values for every configurable setting.

// Policy
pub const DEFAULT_AUTO_APPROVE_THRESHOLD: f64 = 85.0;
pub const DEFAULT_AUTO_REJECT_THRESHOLD: f64 = 20.0;
pub const DEFAULT_COMPLIANCE_WINDOW_DAYS: u32 = 14;
pub const DEFAULT_MAX_DISPATCH_RETRIES: u32 = 3;

// Scoring
pub const DEFAULT_CONFIDENCE_WEIGHT: f64 = 0.40;
pub const DEFAULT_IMPACT_WEIGHT: f64 = 0.25;
pub const DEFAULT_REACH_WEIGHT: f64 = 0.20;
pub const DEFAULT_RECENCY_WEIGHT: f64 = 0.10;
pub const DEFAULT_IMPORTANCE_WEIGHT: f64 = 0.05;
pub const DEFAULT_REACH_CAP_VIEWS: u64 = 1_000_000;
pub const DEFAULT_RECENCY_WINDOW_HOURS: f64 = 24.0;

// Lifecycle
pub const DEFAULT_DISPATCH_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 500;
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 60_000;
pub const DEFAULT_EXPIRY_SWEEP_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 10_000;

// Batch
pub const DEFAULT_BATCH_CONCURRENCY: usize = 10;
pub const DEFAULT_MAX_BATCH_CONCURRENCY: usize = 64;

// Events
pub const DEFAULT_SUBSCRIBER_QUEUE_CAPACITY: usize = 1024;

// Storage
pub const DEFAULT_DB_PATH: &str = "warden.db";
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// Observability
pub const DEFAULT_LOG_LEVEL: &str = "info";
