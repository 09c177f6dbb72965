//! In-memory definition cache with lazy expiry.
//!
//! Entries live for a fixed time-to-live (24 hours by default), measured
//! with a [`Clock`]. Expiry is checked on access: an expired entry is
//! evicted by the `get` that finds it. There is no capacity bound and no
//! background sweep.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::models::WordDefinition;

/// Default time-to-live for cached definitions.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A cached value and when it was stored.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: WordDefinition,
    stored_at: i64,
}

/// Definition cache keyed by (already lowercased) word.
///
/// Thread-safe via internal RwLock.
pub struct DefinitionCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for DefinitionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionCache")
            .field("entries", &self.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl DefinitionCache {
    /// Creates a cache with the default 24 hour TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used to stamp and age entries.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// An entry is fresh while `now - stored_at <= ttl`.
    fn is_fresh(&self, entry: &CacheEntry, now: i64) -> bool {
        let ttl_millis = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        now.saturating_sub(entry.stored_at) <= ttl_millis
    }

    /// Returns the stored value if it is within the TTL.
    ///
    /// An expired entry is removed and `None` is returned.
    pub fn get(&self, key: &str) -> Option<WordDefinition> {
        let now = self.clock.now_millis();
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            let entry = entries.get(key)?;
            if self.is_fresh(entry, now) {
                return Some(entry.value.clone());
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        // Re-check under the write lock; a concurrent `set` may have refreshed it.
        match entries.get(key) {
            Some(entry) if self.is_fresh(entry, now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn set(&self, key: impl Into<String>, value: WordDefinition) {
        let stored_at = self.clock.now_millis();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.into(),
            CacheEntry { value, stored_at },
        );
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let now = self.clock.now_millis();
        let before = entries.len();
        entries.retain(|_, entry| self.is_fresh(entry, now));
        before - entries.len()
    }

    /// Number of entries held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn contains_raw(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(key)
    }
}

impl Default for DefinitionCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Something that can look a word up remotely.
#[async_trait]
pub trait DefinitionSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// `Ok(None)` means the word is not in the dictionary.
    async fn lookup(&self, word: &str) -> Result<Option<WordDefinition>, Self::Error>;
}

/// Definition lookup path with the cache in front of the source.
pub struct CachedLookup<S> {
    source: S,
    cache: DefinitionCache,
}

impl<S: DefinitionSource> CachedLookup<S> {
    pub fn new(source: S, cache: DefinitionCache) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &DefinitionCache {
        &self.cache
    }

    /// Lowercases `word`, serves from cache when fresh, otherwise asks the
    /// source and caches a found definition. Misses are not cached.
    pub async fn define(&self, word: &str) -> Result<Option<WordDefinition>, S::Error> {
        let key = word.trim().to_lowercase();

        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(word = %key, "definition cache hit");
            return Ok(Some(hit));
        }

        let found = self.source.lookup(&key).await?;
        if let Some(def) = &found {
            self.cache.set(key, def.clone());
        }
        Ok(found)
    }
}
