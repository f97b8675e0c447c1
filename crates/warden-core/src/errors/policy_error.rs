use crate::models::ComplexityLevel;

/// Automation policy errors. A rejected policy never replaces the active one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("threshold {name} = {value} is outside 0..=100")]
    ThresholdOutOfRange { name: String, value: f64 },

    #[error("auto-reject threshold {reject} must be below auto-approve threshold {approve} ({scope})")]
    ThresholdOrder {
        approve: f64,
        reject: f64,
        /// `global` or `platform <name>`.
        scope: String,
    },

    #[error("invalid policy value {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    #[error("setting {setting} is locked at complexity level {level:?}")]
    SettingLocked {
        setting: String,
        level: ComplexityLevel,
    },

    #[error("unknown policy version {version}")]
    UnknownVersion { version: u64 },
}
