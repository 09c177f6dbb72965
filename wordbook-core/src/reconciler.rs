//! Local-remote reconciler for favorites and viewing history.
//!
//! Local storage is the durable, offline source; the remote per-account store
//! is the cross-device copy. With an authenticated [`Session`] every read
//! merges both sides, persists the merge locally and writes it back to the
//! remote when the remote copy is missing something.
//!
//! Failure handling:
//! - local-storage failure aborts the operation, is logged, and yields an
//!   empty/default result;
//! - remote failure is logged and degrades to local-only data;
//! - a failed write after a successful merge is logged and the merged result
//!   is still returned.
//!
//! Nothing is retried. Callers are expected to serialize operations per
//! session.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::error::{LocalStoreError, ReconcileError};
use crate::merge::{
    favorites_need_write_back, history_needs_write_back, merge_favorites, merge_history,
    record_view, HISTORY_LIMIT,
};
use crate::models::HistoryEntry;
use crate::remote::{fetch_favorites, fetch_history, RemoteDocument, RemoteStore};
use crate::session::Session;
use crate::store::{LocalStore, StorageKey};

/// Stored value of the words-list-loaded flag.
const WORDS_LIST_LOADED: &str = "loaded";

/// Favorites and history as seen after reconciliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserData {
    pub favorites: Vec<String>,
    pub history: Vec<HistoryEntry>,
}

/// Reconciles on-device and remote favorites/history.
#[derive(Clone)]
pub struct Reconciler {
    local: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteStore>,
    clock: Arc<dyn Clock>,
    history_limit: usize,
}

impl Reconciler {
    pub fn new(local: Arc<dyn LocalStore>, remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            local,
            remote,
            clock: Arc::new(SystemClock),
            history_limit: HISTORY_LIMIT,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // ------------------------------------------------------------------
    // Favorites
    // ------------------------------------------------------------------

    /// Merged favorites, in insertion order.
    pub async fn get_favorites(&self, session: &Session) -> Vec<String> {
        match self.reconcile_favorites(session).await {
            Ok(favorites) => favorites,
            Err(e) => {
                tracing::error!("Error getting favorites: {}", e);
                Vec::new()
            }
        }
    }

    /// Adds `word` to the favorites.
    ///
    /// Returns `false` without writing anything if the word is already a
    /// favorite or local storage fails.
    pub async fn add_favorite(&self, session: &Session, word: &str) -> bool {
        let mut favorites = match self.reconcile_favorites(session).await {
            Ok(favorites) => favorites,
            Err(e) => {
                tracing::error!("Error adding favorite: {}", e);
                return false;
            }
        };

        if favorites.iter().any(|w| w == word) {
            return false;
        }
        favorites.push(word.to_string());

        if let Err(e) = self.write_local(StorageKey::Favorites, &favorites).await {
            tracing::error!("Error adding favorite: {}", e);
            return false;
        }
        self.push_favorites(session, favorites).await;
        true
    }

    /// Removes `word` from the favorites.
    ///
    /// Returns whether the word was a favorite. The filtered list is written
    /// either way.
    pub async fn remove_favorite(&self, session: &Session, word: &str) -> bool {
        let favorites = match self.reconcile_favorites(session).await {
            Ok(favorites) => favorites,
            Err(e) => {
                tracing::error!("Error removing favorite: {}", e);
                return false;
            }
        };

        let before = favorites.len();
        let filtered: Vec<String> = favorites.into_iter().filter(|w| w != word).collect();
        let removed = filtered.len() != before;

        if let Err(e) = self.write_local(StorageKey::Favorites, &filtered).await {
            tracing::error!("Error removing favorite: {}", e);
            return false;
        }
        self.push_favorites(session, filtered).await;
        removed
    }

    pub async fn is_favorite(&self, session: &Session, word: &str) -> bool {
        self.get_favorites(session).await.iter().any(|w| w == word)
    }

    async fn reconcile_favorites(&self, session: &Session) -> Result<Vec<String>, LocalStoreError> {
        let local: Vec<String> = self.read_local(StorageKey::Favorites).await?;

        let Some(account_id) = session.account_id() else {
            return Ok(local);
        };

        let remote = match fetch_favorites(self.remote.as_ref(), account_id).await {
            Ok(remote) => remote,
            Err(e) => {
                tracing::warn!("Error syncing favorites from remote: {}", e);
                return Ok(local);
            }
        };

        let merged = merge_favorites(&local, &remote);

        if let Err(e) = self.write_local(StorageKey::Favorites, &merged).await {
            tracing::error!("Error saving merged favorites locally: {}", e);
        }

        if favorites_need_write_back(&merged, &remote) {
            tracing::debug!(
                account = account_id,
                merged = merged.len(),
                remote = remote.len(),
                "writing merged favorites back to remote",
            );
            if let Err(e) = self
                .remote
                .set(account_id, RemoteDocument::favorites(merged.clone()))
                .await
            {
                tracing::warn!("Error writing merged favorites to remote: {}", e);
            }
        }

        Ok(merged)
    }

    async fn push_favorites(&self, session: &Session, favorites: Vec<String>) {
        let Some(account_id) = session.account_id() else {
            return;
        };
        if let Err(e) = self
            .remote
            .set(account_id, RemoteDocument::favorites(favorites))
            .await
        {
            tracing::warn!("Error saving favorites to remote: {}", e);
        }
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Merged history, most recent first.
    pub async fn get_history(&self, session: &Session) -> Vec<HistoryEntry> {
        match self.reconcile_history(session).await {
            Ok(history) => history,
            Err(e) => {
                tracing::error!("Error getting history: {}", e);
                Vec::new()
            }
        }
    }

    /// Records a view of `word` now, moving it to the front.
    pub async fn add_to_history(&self, session: &Session, word: &str) {
        let history = match self.reconcile_history(session).await {
            Ok(history) => history,
            Err(e) => {
                tracing::error!("Error adding to history: {}", e);
                return;
            }
        };

        let updated = record_view(history, word, self.clock.now_millis(), self.history_limit);

        if let Err(e) = self.write_local(StorageKey::History, &updated).await {
            tracing::error!("Error adding to history: {}", e);
            return;
        }

        if let Some(account_id) = session.account_id() {
            if let Err(e) = self
                .remote
                .set(account_id, RemoteDocument::history(updated))
                .await
            {
                tracing::warn!("Error saving history to remote: {}", e);
            }
        }
    }

    async fn reconcile_history(
        &self,
        session: &Session,
    ) -> Result<Vec<HistoryEntry>, LocalStoreError> {
        let local: Vec<HistoryEntry> = self.read_local(StorageKey::History).await?;

        let Some(account_id) = session.account_id() else {
            return Ok(local);
        };

        let remote = match fetch_history(self.remote.as_ref(), account_id).await {
            Ok(remote) => remote,
            Err(e) => {
                tracing::warn!("Error syncing history from remote: {}", e);
                return Ok(local);
            }
        };

        let merged = merge_history(&local, &remote, self.history_limit);

        if let Err(e) = self.write_local(StorageKey::History, &merged).await {
            tracing::error!("Error saving merged history locally: {}", e);
        }

        if history_needs_write_back(&merged, &remote) {
            if let Err(e) = self
                .remote
                .set(account_id, RemoteDocument::history(merged.clone()))
                .await
            {
                tracing::warn!("Error writing merged history to remote: {}", e);
            }
        }

        Ok(merged)
    }

    // ------------------------------------------------------------------
    // Whole-account transfers
    // ------------------------------------------------------------------

    /// Pushes local favorites and history to the remote as one batch.
    ///
    /// Reads local storage directly, without merging. No-op without a
    /// session.
    pub async fn sync_to_remote(&self, session: &Session) -> Result<(), ReconcileError> {
        let Some(account_id) = session.account_id() else {
            return Ok(());
        };

        let result = async {
            let (favorites, history) = self.read_local_pair().await?;
            self.remote
                .commit_batch(
                    account_id,
                    vec![
                        RemoteDocument::favorites(favorites),
                        RemoteDocument::history(history),
                    ],
                )
                .await?;
            Ok::<(), ReconcileError>(())
        }
        .await;

        if let Err(e) = &result {
            tracing::error!("Error syncing to remote: {}", e);
        }
        result
    }

    /// Fetches both remote documents, merges them with local data, persists
    /// the merge locally and returns it.
    ///
    /// Without a session, or on any failure, returns local-only data.
    pub async fn load_from_remote(&self, session: &Session) -> UserData {
        let anonymous = Session::anonymous();
        let Some(account_id) = session.account_id() else {
            return self.local_user_data(&anonymous).await;
        };

        match self.merge_account(account_id).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Error loading from remote: {}", e);
                self.local_user_data(&anonymous).await
            }
        }
    }

    async fn merge_account(&self, account_id: &str) -> Result<UserData, ReconcileError> {
        let (local_favorites, local_history) = self.read_local_pair().await?;

        let remote = self.remote.as_ref();
        let (remote_favorites, remote_history) = futures::try_join!(
            fetch_favorites(remote, account_id),
            fetch_history(remote, account_id)
        )?;

        let favorites = merge_favorites(&local_favorites, &remote_favorites);
        let history = merge_history(&local_history, &remote_history, self.history_limit);

        futures::try_join!(
            self.write_local(StorageKey::Favorites, &favorites),
            self.write_local(StorageKey::History, &history)
        )?;

        if favorites_need_write_back(&favorites, &remote_favorites)
            || history_needs_write_back(&history, &remote_history)
        {
            let batch = vec![
                RemoteDocument::favorites(favorites.clone()),
                RemoteDocument::history(history.clone()),
            ];
            if let Err(e) = self.remote.commit_batch(account_id, batch).await {
                tracing::warn!("Error writing merged data back to remote: {}", e);
            }
        }

        Ok(UserData { favorites, history })
    }

    async fn local_user_data(&self, session: &Session) -> UserData {
        UserData {
            favorites: self.get_favorites(session).await,
            history: self.get_history(session).await,
        }
    }

    // ------------------------------------------------------------------
    // Words-list flag
    // ------------------------------------------------------------------

    /// Whether the word list has been loaded before on this device.
    pub async fn words_list_loaded(&self) -> bool {
        match self.local.get(StorageKey::WordsListLoaded.as_str()).await {
            Ok(value) => value.as_deref() == Some(WORDS_LIST_LOADED),
            Err(e) => {
                tracing::error!("Error checking words list status: {}", e);
                false
            }
        }
    }

    pub async fn set_words_list_loaded(&self) {
        if let Err(e) = self
            .local
            .set(StorageKey::WordsListLoaded.as_str(), WORDS_LIST_LOADED)
            .await
        {
            tracing::error!("Error setting words list status: {}", e);
        }
    }

    // ------------------------------------------------------------------
    // Local (de)serialization
    // ------------------------------------------------------------------

    async fn read_local<T: DeserializeOwned>(
        &self,
        key: StorageKey,
    ) -> Result<Vec<T>, LocalStoreError> {
        match self.local.get(key.as_str()).await? {
            Some(raw) => serde_json::from_str(&raw).map_err(|source| {
                LocalStoreError::Serialization {
                    key: key.as_str(),
                    source,
                }
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn write_local<T: Serialize>(
        &self,
        key: StorageKey,
        values: &[T],
    ) -> Result<(), LocalStoreError> {
        let raw = serde_json::to_string(values).map_err(|source| {
            LocalStoreError::Serialization {
                key: key.as_str(),
                source,
            }
        })?;
        self.local.set(key.as_str(), &raw).await
    }

    async fn read_local_pair(
        &self,
    ) -> Result<(Vec<String>, Vec<HistoryEntry>), LocalStoreError> {
        futures::try_join!(
            self.read_local::<String>(StorageKey::Favorites),
            self.read_local::<HistoryEntry>(StorageKey::History),
        )
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("history_limit", &self.history_limit)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::TickingClock;
    use crate::remote::MemoryRemoteStore;
    use crate::store::MemoryLocalStore;

    struct Fixture {
        local: Arc<MemoryLocalStore>,
        remote: Arc<MemoryRemoteStore>,
        reconciler: Reconciler,
    }

    fn fixture(local: MemoryLocalStore, remote: MemoryRemoteStore) -> Fixture {
        let local = Arc::new(local);
        let remote = Arc::new(remote);
        let reconciler = Reconciler::new(local.clone(), remote.clone())
            .with_clock(Arc::new(TickingClock::starting_at(1_000)));
        Fixture {
            local,
            remote,
            reconciler,
        }
    }

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn user() -> Session {
        Session::authenticated("user123")
    }

    fn local_favorites(list: &[&str]) -> MemoryLocalStore {
        MemoryLocalStore::new().with_value(
            StorageKey::Favorites,
            serde_json::to_string(&words(list)).unwrap(),
        )
    }

    fn local_history(entries: &[HistoryEntry]) -> MemoryLocalStore {
        MemoryLocalStore::new()
            .with_value(StorageKey::History, serde_json::to_string(entries).unwrap())
    }

    fn stored_history(local: &MemoryLocalStore) -> Vec<HistoryEntry> {
        serde_json::from_str(&local.raw(StorageKey::History).unwrap()).unwrap()
    }

    // --- favorites -----------------------------------------------------

    #[tokio::test]
    async fn test_get_favorites_local_only_without_session() {
        let f = fixture(
            local_favorites(&["word1", "word2"]),
            MemoryRemoteStore::new()
                .with_document("user123", RemoteDocument::favorites(words(&["zzz"]))),
        );

        let result = f.reconciler.get_favorites(&Session::anonymous()).await;

        assert_eq!(result, words(&["word1", "word2"]));
        assert_eq!(f.local.write_count(), 0);
    }

    #[tokio::test]
    async fn test_get_favorites_empty_storage() {
        let f = fixture(MemoryLocalStore::new(), MemoryRemoteStore::new());
        assert!(f.reconciler.get_favorites(&Session::anonymous()).await.is_empty());
    }

    #[tokio::test]
    async fn test_get_favorites_merges_and_writes_back() {
        let f = fixture(
            local_favorites(&["cat", "dog"]),
            MemoryRemoteStore::new()
                .with_document("user123", RemoteDocument::favorites(words(&["dog", "fox"]))),
        );

        let result = f.reconciler.get_favorites(&user()).await;

        assert_eq!(result, words(&["cat", "dog", "fox"]));
        assert_eq!(
            f.local.raw(StorageKey::Favorites).as_deref(),
            Some(r#"["cat","dog","fox"]"#),
        );
        assert_eq!(f.remote.write_count(), 1);
        assert_eq!(f.remote.favorites("user123"), Some(words(&["cat", "dog", "fox"])));
    }

    #[tokio::test]
    async fn test_get_favorites_skips_write_back_when_equal() {
        let f = fixture(
            local_favorites(&["word1", "word2"]),
            MemoryRemoteStore::new()
                .with_document("user123", RemoteDocument::favorites(words(&["word1", "word2"]))),
        );

        f.reconciler.get_favorites(&user()).await;

        assert_eq!(f.remote.write_count(), 0);
        assert_eq!(f.local.write_count(), 1);
    }

    #[tokio::test]
    async fn test_get_favorites_remote_error_returns_local() {
        let f = fixture(local_favorites(&["word1", "word2"]), MemoryRemoteStore::new());
        f.remote.set_fail_reads(true);

        let result = f.reconciler.get_favorites(&user()).await;

        assert_eq!(result, words(&["word1", "word2"]));
        assert_eq!(f.local.write_count(), 0);
    }

    #[tokio::test]
    async fn test_get_favorites_local_error_returns_empty() {
        let f = fixture(local_favorites(&["word1"]), MemoryRemoteStore::new());
        f.local.set_failing(true);

        assert!(f.reconciler.get_favorites(&user()).await.is_empty());
    }

    #[tokio::test]
    async fn test_get_favorites_corrupt_local_returns_empty() {
        let f = fixture(
            MemoryLocalStore::new().with_value(StorageKey::Favorites, "not json"),
            MemoryRemoteStore::new(),
        );
        assert!(f.reconciler.get_favorites(&Session::anonymous()).await.is_empty());
    }

    #[tokio::test]
    async fn test_get_favorites_is_idempotent() {
        let f = fixture(
            local_favorites(&["cat", "dog"]),
            MemoryRemoteStore::new()
                .with_document("user123", RemoteDocument::favorites(words(&["dog", "fox"]))),
        );

        let first = f.reconciler.get_favorites(&user()).await;
        let stored_after_first = f.local.raw(StorageKey::Favorites);
        let second = f.reconciler.get_favorites(&user()).await;

        assert_eq!(first, second);
        assert_eq!(f.local.raw(StorageKey::Favorites), stored_after_first);
        // Only the first call had anything new to push.
        assert_eq!(f.remote.write_count(), 1);
    }

    #[tokio::test]
    async fn test_add_favorite_local_only() {
        let f = fixture(local_favorites(&[]), MemoryRemoteStore::new());

        assert!(f.reconciler.add_favorite(&Session::anonymous(), "word1").await);

        assert_eq!(
            f.local.raw(StorageKey::Favorites).as_deref(),
            Some(r#"["word1"]"#),
        );
        assert_eq!(f.remote.write_count(), 0);
    }

    #[tokio::test]
    async fn test_add_existing_favorite_writes_nothing() {
        let f = fixture(local_favorites(&["cat"]), MemoryRemoteStore::new());

        assert!(!f.reconciler.add_favorite(&Session::anonymous(), "cat").await);
        assert_eq!(f.local.write_count(), 0);
    }

    #[tokio::test]
    async fn test_add_favorite_pushes_to_remote() {
        let f = fixture(local_favorites(&[]), MemoryRemoteStore::new());

        f.reconciler.add_favorite(&user(), "word1").await;

        assert_eq!(f.remote.favorites("user123"), Some(words(&["word1"])));
    }

    #[tokio::test]
    async fn test_add_favorite_remote_failure_keeps_local_write() {
        let f = fixture(local_favorites(&[]), MemoryRemoteStore::new());
        f.remote.set_fail_writes(true);

        assert!(f.reconciler.add_favorite(&user(), "word1").await);
        assert_eq!(
            f.local.raw(StorageKey::Favorites).as_deref(),
            Some(r#"["word1"]"#),
        );
    }

    #[tokio::test]
    async fn test_add_favorite_local_failure_writes_nothing() {
        let f = fixture(local_favorites(&["cat"]), MemoryRemoteStore::new());
        f.local.set_failing(true);

        assert!(!f.reconciler.add_favorite(&user(), "dog").await);
        assert_eq!(f.remote.write_count(), 0);
    }

    #[tokio::test]
    async fn test_remove_favorite() {
        let f = fixture(local_favorites(&["word1", "word2"]), MemoryRemoteStore::new());

        assert!(f.reconciler.remove_favorite(&user(), "word1").await);

        assert_eq!(
            f.local.raw(StorageKey::Favorites).as_deref(),
            Some(r#"["word2"]"#),
        );
        assert_eq!(f.remote.favorites("user123"), Some(words(&["word2"])));
    }

    #[tokio::test]
    async fn test_remove_missing_favorite() {
        let f = fixture(local_favorites(&["word1"]), MemoryRemoteStore::new());
        assert!(!f.reconciler.remove_favorite(&Session::anonymous(), "nope").await);
        assert_eq!(
            f.local.raw(StorageKey::Favorites).as_deref(),
            Some(r#"["word1"]"#),
        );
    }

    #[tokio::test]
    async fn test_is_favorite() {
        let f = fixture(local_favorites(&["word1", "word2"]), MemoryRemoteStore::new());
        let session = Session::anonymous();

        assert!(f.reconciler.is_favorite(&session, "word1").await);
        assert!(!f.reconciler.is_favorite(&session, "word3").await);
    }

    #[tokio::test]
    async fn test_is_favorite_sees_remote_words() {
        let f = fixture(
            local_favorites(&[]),
            MemoryRemoteStore::new()
                .with_document("user123", RemoteDocument::favorites(words(&["fox"]))),
        );
        assert!(f.reconciler.is_favorite(&user(), "fox").await);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let f = fixture(
            local_favorites(&[]),
            MemoryRemoteStore::new()
                .with_document("alice", RemoteDocument::favorites(words(&["apple"])))
                .with_document("bob", RemoteDocument::favorites(words(&["banana"]))),
        );

        let alice = Session::authenticated("alice");
        let bob = Session::authenticated("bob");
        f.reconciler.add_favorite(&alice, "avocado").await;

        assert_eq!(f.remote.favorites("alice"), Some(words(&["apple", "avocado"])));
        assert_eq!(f.remote.favorites("bob"), Some(words(&["banana"])));
        assert!(f.reconciler.is_favorite(&bob, "banana").await);
    }

    // --- history -------------------------------------------------------

    #[tokio::test]
    async fn test_get_history_local_only() {
        let history = vec![HistoryEntry::new("word1", 1000), HistoryEntry::new("word2", 2000)];
        let f = fixture(local_history(&history), MemoryRemoteStore::new());

        let result = f.reconciler.get_history(&Session::anonymous()).await;

        assert_eq!(result, history);
    }

    #[tokio::test]
    async fn test_get_history_remote_timestamp_wins() {
        let f = fixture(
            local_history(&[HistoryEntry::new("cat", 100)]),
            MemoryRemoteStore::new().with_document(
                "user123",
                RemoteDocument::history(vec![
                    HistoryEntry::new("cat", 200),
                    HistoryEntry::new("dog", 50),
                ]),
            ),
        );

        let result = f.reconciler.get_history(&user()).await;

        assert_eq!(
            result,
            vec![HistoryEntry::new("cat", 200), HistoryEntry::new("dog", 50)],
        );
        assert_eq!(stored_history(&f.local), result);
        // Merged equals remote; nothing to push.
        assert_eq!(f.remote.write_count(), 0);
    }

    #[tokio::test]
    async fn test_get_history_merges_three_way() {
        let f = fixture(
            local_history(&[HistoryEntry::new("word1", 1000), HistoryEntry::new("word2", 2000)]),
            MemoryRemoteStore::new().with_document(
                "user123",
                RemoteDocument::history(vec![
                    HistoryEntry::new("word1", 3000),
                    HistoryEntry::new("word3", 1500),
                ]),
            ),
        );

        let result = f.reconciler.get_history(&user()).await;

        assert_eq!(result.len(), 3);
        let at = |w: &str| result.iter().find(|e| e.word == w).map(|e| e.viewed_at);
        assert_eq!(at("word1"), Some(3000));
        assert_eq!(at("word2"), Some(2000));
        assert_eq!(at("word3"), Some(1500));
        assert_eq!(f.remote.history("user123"), Some(result));
    }

    #[tokio::test]
    async fn test_get_history_writes_back_newer_local_timestamp() {
        let f = fixture(
            local_history(&[HistoryEntry::new("cat", 900)]),
            MemoryRemoteStore::new()
                .with_document(
                    "user123",
                    RemoteDocument::history(vec![HistoryEntry::new("cat", 100)]),
                ),
        );

        f.reconciler.get_history(&user()).await;

        assert_eq!(
            f.remote.history("user123"),
            Some(vec![HistoryEntry::new("cat", 900)]),
        );
    }

    #[tokio::test]
    async fn test_get_history_limits_to_100() {
        let local: Vec<HistoryEntry> = (0..60)
            .map(|i| HistoryEntry::new(format!("word{}", i), i * 1000))
            .collect();
        let remote: Vec<HistoryEntry> = (60..120)
            .map(|i| HistoryEntry::new(format!("word{}", i), i * 1000))
            .collect();
        let f = fixture(
            local_history(&local),
            MemoryRemoteStore::new().with_document("user123", RemoteDocument::history(remote)),
        );

        let result = f.reconciler.get_history(&user()).await;

        assert_eq!(result.len(), 100);
    }

    #[tokio::test]
    async fn test_get_history_remote_error_returns_local() {
        let history = vec![HistoryEntry::new("word1", 1000)];
        let f = fixture(local_history(&history), MemoryRemoteStore::new());
        f.remote.set_fail_reads(true);

        assert_eq!(f.reconciler.get_history(&user()).await, history);
    }

    #[tokio::test]
    async fn test_add_to_history_new_word() {
        let f = fixture(local_history(&[]), MemoryRemoteStore::new());

        f.reconciler.add_to_history(&Session::anonymous(), "word1").await;

        assert_eq!(stored_history(&f.local), vec![HistoryEntry::new("word1", 1000)]);
    }

    #[tokio::test]
    async fn test_add_to_history_updates_existing_word() {
        let f = fixture(
            local_history(&[HistoryEntry::new("dog", 500), HistoryEntry::new("word1", 100)]),
            MemoryRemoteStore::new(),
        );

        f.reconciler.add_to_history(&Session::anonymous(), "word1").await;

        let saved = stored_history(&f.local);
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].word, "word1");
        assert!(saved[0].viewed_at > 100);
        assert_eq!(saved[1].word, "dog");
    }

    #[tokio::test]
    async fn test_add_to_history_caps_at_100() {
        let f = fixture(MemoryLocalStore::new(), MemoryRemoteStore::new());
        let session = Session::anonymous();

        for i in 0..101 {
            f.reconciler.add_to_history(&session, &format!("word{}", i)).await;
        }

        let saved = stored_history(&f.local);
        assert_eq!(saved.len(), 100);
        assert!(saved.iter().all(|e| e.word != "word0"));
        assert_eq!(saved[0].word, "word100");
    }

    #[tokio::test]
    async fn test_add_to_history_caps_at_100_with_session() {
        let f = fixture(MemoryLocalStore::new(), MemoryRemoteStore::new());

        for i in 0..101 {
            f.reconciler.add_to_history(&user(), &format!("word{}", i)).await;
        }

        let remote = f.remote.history("user123").unwrap();
        assert_eq!(remote.len(), 100);
        assert!(remote.iter().all(|e| e.word != "word0"));
    }

    #[tokio::test]
    async fn test_add_to_history_remote_failure_is_soft() {
        let f = fixture(MemoryLocalStore::new(), MemoryRemoteStore::new());
        f.remote.set_fail_writes(true);

        f.reconciler.add_to_history(&user(), "word1").await;

        assert_eq!(stored_history(&f.local).len(), 1);
    }

    // --- sync / load ---------------------------------------------------

    #[tokio::test]
    async fn test_sync_to_remote_without_session_is_noop() {
        let f = fixture(local_favorites(&["cat"]), MemoryRemoteStore::new());

        f.reconciler.sync_to_remote(&Session::anonymous()).await.unwrap();

        assert_eq!(f.remote.write_count(), 0);
    }

    #[tokio::test]
    async fn test_sync_to_remote_writes_local_data_verbatim() {
        let f = fixture(
            local_favorites(&["cat"]),
            MemoryRemoteStore::new()
                .with_document("user123", RemoteDocument::favorites(words(&["fox"]))),
        );

        f.reconciler.sync_to_remote(&user()).await.unwrap();

        assert_eq!(f.remote.write_count(), 1);
        assert_eq!(f.remote.favorites("user123"), Some(words(&["cat"])));
        assert_eq!(f.remote.history("user123"), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_sync_to_remote_reports_failure_without_partial_write() {
        let f = fixture(local_favorites(&["cat"]), MemoryRemoteStore::new());
        f.remote.set_fail_writes(true);

        let result = f.reconciler.sync_to_remote(&user()).await;

        assert!(matches!(result, Err(ReconcileError::Remote(_))));
        assert!(f.remote.favorites("user123").is_none());
        assert!(f.remote.history("user123").is_none());
    }

    #[tokio::test]
    async fn test_sync_to_remote_reports_local_failure() {
        let f = fixture(local_favorites(&["cat"]), MemoryRemoteStore::new());
        f.local.set_failing(true);

        let result = f.reconciler.sync_to_remote(&user()).await;
        assert!(matches!(result, Err(ReconcileError::Local(_))));
    }

    #[tokio::test]
    async fn test_load_from_remote_merges_and_persists() {
        let local = MemoryLocalStore::new()
            .with_value(StorageKey::Favorites, r#"["cat","dog"]"#)
            .with_value(StorageKey::History, r#"[{"word":"cat","viewedAt":100}]"#);
        let remote = MemoryRemoteStore::new()
            .with_document("user123", RemoteDocument::favorites(words(&["dog", "fox"])))
            .with_document(
                "user123",
                RemoteDocument::history(vec![
                    HistoryEntry::new("cat", 200),
                    HistoryEntry::new("dog", 50),
                ]),
            );
        let f = fixture(local, remote);

        let data = f.reconciler.load_from_remote(&user()).await;

        assert_eq!(data.favorites, words(&["cat", "dog", "fox"]));
        assert_eq!(
            data.history,
            vec![HistoryEntry::new("cat", 200), HistoryEntry::new("dog", 50)],
        );
        assert_eq!(stored_history(&f.local), data.history);
        assert_eq!(f.remote.favorites("user123"), Some(data.favorites.clone()));
        assert_eq!(f.remote.write_count(), 1);
    }

    #[tokio::test]
    async fn test_load_from_remote_in_sync_writes_nothing_remote() {
        let local = local_favorites(&["cat"]);
        let remote = MemoryRemoteStore::new()
            .with_document("user123", RemoteDocument::favorites(words(&["cat"])))
            .with_document("user123", RemoteDocument::history(Vec::new()));
        let f = fixture(local, remote);

        f.reconciler.load_from_remote(&user()).await;

        assert_eq!(f.remote.write_count(), 0);
    }

    #[tokio::test]
    async fn test_load_from_remote_error_falls_back_to_local() {
        let local = MemoryLocalStore::new()
            .with_value(StorageKey::Favorites, r#"["cat"]"#)
            .with_value(StorageKey::History, r#"[{"word":"cat","viewedAt":100}]"#);
        let f = fixture(local, MemoryRemoteStore::new());
        f.remote.set_fail_reads(true);

        let data = f.reconciler.load_from_remote(&user()).await;

        assert_eq!(data.favorites, words(&["cat"]));
        assert_eq!(data.history, vec![HistoryEntry::new("cat", 100)]);
        assert_eq!(f.local.write_count(), 0);
    }

    #[tokio::test]
    async fn test_load_from_remote_without_session() {
        let f = fixture(local_favorites(&["cat"]), MemoryRemoteStore::new());

        let data = f.reconciler.load_from_remote(&Session::anonymous()).await;

        assert_eq!(data.favorites, words(&["cat"]));
        assert!(data.history.is_empty());
    }

    // --- words list flag -------------------------------------------------

    #[tokio::test]
    async fn test_words_list_flag() {
        let f = fixture(MemoryLocalStore::new(), MemoryRemoteStore::new());
        assert!(!f.reconciler.words_list_loaded().await);

        f.reconciler.set_words_list_loaded().await;

        assert!(f.reconciler.words_list_loaded().await);
        assert_eq!(
            f.local.raw(StorageKey::WordsListLoaded).as_deref(),
            Some("loaded"),
        );
    }

    #[tokio::test]
    async fn test_words_list_flag_local_failure_reads_false() {
        let f = fixture(
            MemoryLocalStore::new().with_value(StorageKey::WordsListLoaded, "loaded"),
            MemoryRemoteStore::new(),
        );
        f.local.set_failing(true);
        assert!(!f.reconciler.words_list_loaded().await);
    }
}
