use serde::{Deserialize, Serialize};

use super::defaults;

/// Batch orchestrator limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Hard ceiling applied to every requested concurrency.
    pub max_concurrency: usize,
    /// Maximum number of case ids in one batch.
    pub max_items: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: defaults::DEFAULT_MAX_BATCH_CONCURRENCY,
            max_items: crate::constants::MAX_BATCH_ITEMS,
        }
    }
}
