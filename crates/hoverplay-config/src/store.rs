//! In-memory preference store.

use async_trait::async_trait;
use hoverplay_protocols::{ChangeSet, PreferenceMap, PreferenceStore, StorageChange, StoreError};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

const CHANGE_CAPACITY: usize = 64;

/// A [`PreferenceStore`] kept in process memory.
///
/// Writes only notify subscribers about keys whose value actually changed,
/// in the order the writes happened.
pub struct MemoryPreferenceStore {
    values: RwLock<PreferenceMap>,
    changes: broadcast::Sender<ChangeSet>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::with_values(PreferenceMap::new())
    }

    pub fn with_values(values: PreferenceMap) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            values: RwLock::new(values),
            changes,
        }
    }

    /// Current values, without going through the async trait.
    pub fn snapshot(&self) -> PreferenceMap {
        self.values.read().clone()
    }

    /// Remove keys; subscribers see them with no new value.
    pub fn remove(&self, keys: &[&str]) {
        let mut change_set = ChangeSet::new();
        {
            let mut values = self.values.write();
            for key in keys {
                if let Some(old) = values.remove(*key) {
                    change_set.insert(
                        key.to_string(),
                        StorageChange {
                            old_value: Some(old),
                            new_value: None,
                        },
                    );
                }
            }
        }
        self.publish(change_set);
    }

    fn publish(&self, change_set: ChangeSet) {
        if change_set.is_empty() {
            return;
        }
        debug!("Preference change: {:?}", change_set.keys().collect::<Vec<_>>());
        // No subscriber is not an error.
        let _ = self.changes.send(change_set);
    }
}

impl Default for MemoryPreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn load(&self) -> Result<PreferenceMap, StoreError> {
        Ok(self.snapshot())
    }

    async fn save(&self, values: PreferenceMap) -> Result<(), StoreError> {
        let mut change_set = ChangeSet::new();
        {
            let mut stored = self.values.write();
            for (key, value) in values {
                let old = stored.get(&key).cloned();
                if old.as_ref() == Some(&value) {
                    continue;
                }
                stored.insert(key.clone(), value.clone());
                change_set.insert(
                    key,
                    StorageChange {
                        old_value: old,
                        new_value: Some(value),
                    },
                );
            }
        }
        self.publish(change_set);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeSet> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(pairs: &[(&str, serde_json::Value)]) -> PreferenceMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = MemoryPreferenceStore::new();
        store.save(map(&[("width", json!(640))])).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.get("width"), Some(&json!(640)));
    }

    #[tokio::test]
    async fn test_save_notifies_changed_keys_only() {
        let store = MemoryPreferenceStore::with_values(map(&[("dark", json!(true))]));
        let mut rx = store.subscribe();

        store
            .save(map(&[("dark", json!(true)), ("volume", json!(0.3))]))
            .await
            .unwrap();

        let changes = rx.recv().await.unwrap();
        assert_eq!(changes.len(), 1);
        let change = changes.get("volume").unwrap();
        assert_eq!(change.old_value, None);
        assert_eq!(change.new_value, Some(json!(0.3)));
    }

    #[tokio::test]
    async fn test_unchanged_save_is_silent() {
        let store = MemoryPreferenceStore::with_values(map(&[("dark", json!(true))]));
        let mut rx = store.subscribe();

        store.save(map(&[("dark", json!(true))])).await.unwrap();
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_changes_delivered_in_order() {
        let store = MemoryPreferenceStore::new();
        let mut rx = store.subscribe();

        store.save(map(&[("width", json!(300))])).await.unwrap();
        store.save(map(&[("width", json!(400))])).await.unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first["width"].new_value, Some(json!(300)));
        assert_eq!(second["width"].old_value, Some(json!(300)));
        assert_eq!(second["width"].new_value, Some(json!(400)));
    }

    #[tokio::test]
    async fn test_remove_publishes_removal() {
        let store = MemoryPreferenceStore::with_values(map(&[("hotkey", json!("q"))]));
        let mut rx = store.subscribe();

        store.remove(&["hotkey", "missing"]);

        let changes = rx.recv().await.unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes["hotkey"].new_value, None);
        assert!(store.snapshot().is_empty());
    }
}
