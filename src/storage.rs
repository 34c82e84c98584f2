//! Durable key-value storage trait — the wizard's persistence seam.
//!
//! The host app supplies the real backend (device storage, a settings
//! table, whatever). The wizard only ever touches the two keys in
//! [`storage_keys`] and treats every failure as best-effort.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StorageError;

/// Storage keys used by the wizard.
pub mod storage_keys {
    /// Key for the serialized draft envelope.
    pub const DRAFT: &str = "onboarding_draft";
    /// Key for the completion marker.
    pub const COMPLETED: &str = "onboarding_completed";
    /// Sentinel value stored under [`COMPLETED`].
    pub const COMPLETED_SENTINEL: &str = "true";
}

/// Backend-agnostic async key-value storage.
#[async_trait]
pub trait DraftStorage: Send + Sync {
    /// Read the value for `key`, if present.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, overwriting any existing value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage backend, for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value, bypassing the trait. Test convenience.
    pub async fn seed(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl DraftStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
