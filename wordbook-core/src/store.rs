//! On-device key-value storage contract.
//!
//! Values are strings; the reconciler owns their format (one JSON array per
//! key). The store is addressed by three fixed keys, see [`StorageKey`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::error::LocalStoreError;

/// The fixed keys the reconciler reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Favorites,
    History,
    WordsListLoaded,
}

impl StorageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Favorites => "wordbook:favorites",
            StorageKey::History => "wordbook:history",
            StorageKey::WordsListLoaded => "wordbook:wordsList",
        }
    }
}

/// Asynchronous string key-value store on the device.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Returns `Ok(None)` when nothing is stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError>;
}

/// In-process store backed by a `HashMap`.
///
/// Counts successful writes and can be told to fail, which makes it the
/// store of choice for exercising fail paths.
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    values: RwLock<HashMap<String, String>>,
    writes: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a value without counting it as a write.
    pub fn with_value(self, key: StorageKey, value: impl Into<String>) -> Self {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.as_str().to_string(), value.into());
        self
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes every subsequent `get`/`set` fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Current raw value, bypassing the failure switch.
    pub fn raw(&self, key: StorageKey) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key.as_str())
            .cloned()
    }

    fn check(&self) -> Result<(), LocalStoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LocalStoreError::Io("storage unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LocalStore for MemoryLocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
        self.check()?;
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        self.check()?;
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
