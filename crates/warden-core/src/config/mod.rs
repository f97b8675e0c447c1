//! Engine configuration loaded from TOML.
//!
//! Every section is `#[serde(default)]`, so an empty document is a valid config.

mod batch_config;
pub mod defaults;
mod events_config;
mod lifecycle_config;
mod observability_config;
mod scoring_config;
mod storage_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{WardenError, WardenResult};
use crate::models::AutomationPolicy;

pub use batch_config::BatchConfig;
pub use events_config::{EventsConfig, OverflowPolicy};
pub use lifecycle_config::LifecycleConfig;
pub use observability_config::ObservabilityConfig;
pub use scoring_config::{ScoringConfig, ScoringWeights};
pub use storage_config::StorageConfig;

/// Root configuration for a Warden engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    pub storage: StorageConfig,
    pub scoring: ScoringConfig,
    /// Initial automation policy, used when the store holds no published version.
    pub policy: AutomationPolicy,
    pub lifecycle: LifecycleConfig,
    pub batch: BatchConfig,
    pub events: EventsConfig,
    pub observability: ObservabilityConfig,
}

impl WardenConfig {
    /// Parse a TOML document.
    pub fn from_toml(toml_str: &str) -> WardenResult<Self> {
        toml::from_str(toml_str).map_err(|e| WardenError::ConfigError(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> WardenResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WardenError::ConfigError(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }
}
