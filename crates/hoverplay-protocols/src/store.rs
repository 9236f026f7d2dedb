//! Preference store protocol definitions.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::StoreError;

/// Flat key/value mapping of persisted preferences.
pub type PreferenceMap = serde_json::Map<String, Value>;

/// One changed key in a change notification.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    /// `None` when the key was removed from storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

impl StorageChange {
    pub fn set(value: Value) -> Self {
        Self {
            old_value: None,
            new_value: Some(value),
        }
    }

    pub fn removed() -> Self {
        Self::default()
    }
}

/// Change notification: every key that changed in one write.
pub type ChangeSet = BTreeMap<String, StorageChange>;

/// Persisted user preferences plus their change stream.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Read every persisted preference.
    async fn load(&self) -> Result<PreferenceMap, StoreError>;

    /// Persist the given keys; subscribers receive the resulting change set.
    async fn save(&self, values: PreferenceMap) -> Result<(), StoreError>;

    /// Subscribe to change notifications, delivered in write order.
    fn subscribe(&self) -> broadcast::Receiver<ChangeSet>;
}
