use chrono::{DateTime, Utc};

/// Recency factor: `max(0, 1 - hours_since_detection / window)`.
///
/// Detection times in the future count as zero hours old.
pub fn calculate(detected_at: DateTime<Utc>, now: DateTime<Utc>, window_hours: f64) -> f64 {
    if !(window_hours > 0.0) {
        return 0.0;
    }
    let hours = (now - detected_at).num_seconds().max(0) as f64 / 3600.0;
    (1.0 - hours / window_hours).max(0.0)
}
