//! PolicyRegistry: the active policy version plus every version ever published.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::Utc;
use tracing::{info, warn};

use warden_core::errors::{PolicyError, WardenResult};
use warden_core::models::{AutomationPolicy, ComplexityLevel, PolicyPatch, PolicyVersion};
use warden_core::traits::IPolicyStore;

use super::validate::validate_policy;

/// Versioned policy holder.
///
/// Readers take an `Arc` snapshot of the current version; publishing a new
/// version never affects decisions already made against an older one.
pub struct PolicyRegistry {
    current: RwLock<Arc<PolicyVersion>>,
    history: RwLock<BTreeMap<u64, Arc<PolicyVersion>>>,
    store: Option<Arc<dyn IPolicyStore>>,
    /// Serializes publishers so version numbers stay dense.
    publish: Mutex<()>,
}

impl PolicyRegistry {
    /// In-memory registry starting at version 1.
    pub fn new(initial: AutomationPolicy) -> WardenResult<Self> {
        let initial = initial.normalized();
        validate_policy(&initial)?;
        Ok(Self::from_version(
            PolicyVersion {
                version: 1,
                policy: initial,
                created_at: Utc::now(),
            },
            None,
        ))
    }

    /// Registry backed by a store. Resumes from the latest stored version,
    /// or publishes `initial` as version 1 into an empty store.
    pub fn with_store(
        initial: AutomationPolicy,
        store: Arc<dyn IPolicyStore>,
    ) -> WardenResult<Self> {
        if let Some(latest) = store.latest_policy_version()? {
            info!(version = latest.version, "loaded automation policy from store");
            return Ok(Self::from_version(latest, Some(store)));
        }
        let initial = initial.normalized();
        validate_policy(&initial)?;
        let first = PolicyVersion {
            version: 1,
            policy: initial,
            created_at: Utc::now(),
        };
        store.save_policy_version(&first)?;
        info!(version = 1, "published initial automation policy");
        Ok(Self::from_version(first, Some(store)))
    }

    fn from_version(version: PolicyVersion, store: Option<Arc<dyn IPolicyStore>>) -> Self {
        let version = Arc::new(version);
        let mut history = BTreeMap::new();
        history.insert(version.version, Arc::clone(&version));
        Self {
            current: RwLock::new(version),
            history: RwLock::new(history),
            store,
            publish: Mutex::new(()),
        }
    }

    /// Snapshot of the active version.
    pub fn current(&self) -> Arc<PolicyVersion> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Any version ever published.
    pub fn get(&self, version: u64) -> WardenResult<Arc<PolicyVersion>> {
        if let Some(found) = self
            .history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&version)
        {
            return Ok(Arc::clone(found));
        }
        if let Some(store) = &self.store {
            if let Some(stored) = store.get_policy_version(version)? {
                let stored = Arc::new(stored);
                self.history
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(version, Arc::clone(&stored));
                return Ok(stored);
            }
        }
        Err(PolicyError::UnknownVersion { version }.into())
    }

    /// Version numbers known in memory, ascending.
    pub fn versions(&self) -> Vec<u64> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    /// Validate and publish a whole new policy.
    pub fn replace(&self, policy: AutomationPolicy) -> WardenResult<Arc<PolicyVersion>> {
        let _guard = self.publish.lock().unwrap_or_else(PoisonError::into_inner);
        self.publish_locked(policy.normalized())
    }

    /// Apply a partial update on top of the current version.
    ///
    /// In basic mode only thresholds, batching preferences, and the
    /// complexity level itself may change. The level that applies is the
    /// one the patch sets, or the current one when the patch leaves it alone.
    pub fn patch(&self, patch: &PolicyPatch) -> WardenResult<Arc<PolicyVersion>> {
        let _guard = self.publish.lock().unwrap_or_else(PoisonError::into_inner);
        let base = self.current();
        let level = patch.complexity.unwrap_or(base.policy.complexity);
        if level == ComplexityLevel::Basic {
            if let Some(setting) = patch.advanced_fields().first() {
                warn!(setting = *setting, "rejected policy patch touching a locked setting");
                return Err(PolicyError::SettingLocked {
                    setting: (*setting).to_string(),
                    level,
                }
                .into());
            }
        }
        self.publish_locked(patch.apply_to(&base.policy).normalized())
    }

    fn publish_locked(&self, policy: AutomationPolicy) -> WardenResult<Arc<PolicyVersion>> {
        if let Err(e) = validate_policy(&policy) {
            warn!(error = %e, "rejected policy update");
            return Err(e);
        }
        let next = PolicyVersion {
            version: self.current().version + 1,
            policy,
            created_at: Utc::now(),
        };
        if let Some(store) = &self.store {
            store.save_policy_version(&next)?;
        }
        let next = Arc::new(next);
        self.history
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(next.version, Arc::clone(&next));
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next);
        info!(version = next.version, "published automation policy");
        Ok(next)
    }
}
