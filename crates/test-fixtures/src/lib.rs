//! Test fixtures for Warden: case builders, a scripted notice dispatcher,
//! store helpers, and golden decision datasets.

mod builders;
mod dispatcher;

pub use builders::*;
pub use dispatcher::{DispatchScript, ScriptedDispatcher};

use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use warden_core::models::{Action, AutomationPolicy, PriorityClass, ThresholdSource};
use warden_storage::StorageEngine;

/// Root of the golden datasets shipped with this crate.
fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("golden")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

pub fn fixture_exists(relative_path: &str) -> bool {
    fixtures_root().join(relative_path).exists()
}

/// List all JSON files in a fixture subdirectory, sorted by name.
pub fn list_fixtures(subdir: &str) -> Vec<PathBuf> {
    let dir = fixtures_root().join(subdir);
    if !dir.exists() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)
        .unwrap_or_else(|e| panic!("Failed to read directory {}: {}", dir.display(), e))
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            path.extension().is_some_and(|ext| ext == "json").then_some(path)
        })
        .collect();
    files.sort();
    files
}

/// One golden decision: a policy, a case shape, and the expected outcome.
#[derive(Debug, Clone, Deserialize)]
pub struct GoldenDecision {
    pub name: String,
    #[serde(default)]
    pub policy: AutomationPolicy,
    pub confidence: f64,
    pub priority: PriorityClass,
    pub platform: String,
    pub expected_action: Action,
    pub expected_source: ThresholdSource,
}

/// A golden dataset file: a list of decisions sharing a theme.
#[derive(Debug, Clone, Deserialize)]
pub struct GoldenDecisionSet {
    pub description: String,
    pub cases: Vec<GoldenDecision>,
}

/// Every golden decision set under `golden/decisions`.
pub fn load_decision_sets() -> Vec<GoldenDecisionSet> {
    list_fixtures("decisions")
        .into_iter()
        .map(|path| {
            let name = path
                .strip_prefix(fixtures_root())
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|_| path.to_string_lossy().into_owned());
            load_fixture(&name)
        })
        .collect()
}

/// Fresh in-memory store, shared the way the engines expect it.
pub fn open_store() -> Arc<StorageEngine> {
    Arc::new(StorageEngine::open_in_memory().expect("in-memory storage"))
}
