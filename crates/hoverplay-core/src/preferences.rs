//! Binding between the persisted preference store and the engine.
//!
//! The engine reads preferences through one [`SharedPreferences`] handle.
//! The binding loads it once at attach and then applies change
//! notifications to it in place, key by key, in arrival order.

use std::sync::Arc;

use hoverplay_config::{AppliedChanges, PreferenceLoader, Preferences};
use hoverplay_protocols::{ChangeSet, PreferenceMap, PreferenceStore, StoreError};
use parking_lot::{RwLock, RwLockReadGuard};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// The one preference handle every engine component reads.
#[derive(Clone, Default)]
pub struct SharedPreferences(Arc<RwLock<Preferences>>);

impl SharedPreferences {
    pub fn new(prefs: Preferences) -> Self {
        Self(Arc::new(RwLock::new(prefs)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Preferences> {
        self.0.read()
    }

    pub fn snapshot(&self) -> Preferences {
        self.0.read().clone()
    }

    fn apply(&self, changes: &ChangeSet) -> AppliedChanges {
        self.0.write().apply_changes(changes)
    }
}

/// Keeps [`SharedPreferences`] in sync with a [`PreferenceStore`].
pub struct PreferenceBinding {
    store: Arc<dyn PreferenceStore>,
    prefs: SharedPreferences,
}

impl PreferenceBinding {
    /// Load persisted preferences merged over defaults.
    ///
    /// The change stream is subscribed before the load so no write between
    /// the two is missed.
    pub async fn attach(
        store: Arc<dyn PreferenceStore>,
    ) -> Result<(Self, broadcast::Receiver<ChangeSet>), StoreError> {
        let changes = store.subscribe();
        let values = store.load().await?;
        let prefs = PreferenceLoader::merge_over_defaults(&values);
        debug!("Preferences loaded: {} persisted keys", values.len());
        Ok((
            Self {
                store,
                prefs: SharedPreferences::new(prefs),
            },
            changes,
        ))
    }

    pub fn prefs(&self) -> &SharedPreferences {
        &self.prefs
    }

    /// Apply one change notification. Rejected keys keep their value.
    pub fn apply(&self, changes: &ChangeSet) -> AppliedChanges {
        let outcome = self.prefs.apply(changes);
        for rejected in &outcome.rejected {
            warn!("Ignoring preference change: {}", rejected);
        }
        if !outcome.applied.is_empty() {
            debug!("Preferences changed: {:?}", outcome.applied);
        }
        outcome
    }

    /// Persist one key; the engine sees it through the change stream.
    pub async fn persist(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut values = PreferenceMap::new();
        values.insert(key.to_string(), value);
        self.store.save(values).await
    }
}
