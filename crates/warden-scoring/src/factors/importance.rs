use warden_core::constants::{PROFILE_IMPORTANCE_MAX, PROFILE_IMPORTANCE_MIN};

/// Profile importance factor: `clamp(importance, 1, 10) / 10`.
pub fn calculate(importance: u8) -> f64 {
    f64::from(importance.clamp(PROFILE_IMPORTANCE_MIN, PROFILE_IMPORTANCE_MAX))
        / f64::from(PROFILE_IMPORTANCE_MAX)
}
