/// Warden engine version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lowest value a confidence or similarity score can take.
pub const SCORE_MIN: f64 = 0.0;

/// Highest value a confidence or similarity score can take.
pub const SCORE_MAX: f64 = 100.0;

/// Upper bound of the priority rank scale.
pub const RANK_MAX: f64 = 100.0;

/// Rank at or above which a case is critical.
pub const CRITICAL_RANK: f64 = 80.0;

/// Rank at or above which a case is high priority.
pub const HIGH_RANK: f64 = 60.0;

/// Rank at or above which a case is medium priority.
pub const MEDIUM_RANK: f64 = 40.0;

/// Profile importance bounds (inclusive).
pub const PROFILE_IMPORTANCE_MIN: u8 = 1;
pub const PROFILE_IMPORTANCE_MAX: u8 = 10;

/// Maximum number of case ids accepted by a single batch.
pub const MAX_BATCH_ITEMS: usize = 10_000;

/// Tolerance used when checking that scoring weights sum to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;
