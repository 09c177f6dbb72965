//! In-process remote store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use super::{DocKind, RemoteDocument, RemoteStore};
use crate::error::RemoteError;
use crate::models::HistoryEntry;

/// Remote store kept in memory, keyed by `(account, kind)`.
///
/// Reads and writes can be switched to fail independently, and successful
/// writes are counted (a batch counts once).
#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    docs: RwLock<HashMap<(String, DocKind), RemoteDocument>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a document without counting it as a write.
    pub fn with_document(self, account_id: &str, doc: RemoteDocument) -> Self {
        self.docs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert((account_id.to_string(), doc.kind()), doc);
        self
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Stored favorites for an account, if the document exists.
    pub fn favorites(&self, account_id: &str) -> Option<Vec<String>> {
        match self.document(account_id, DocKind::Favorites)? {
            RemoteDocument::Favorites(doc) => Some(doc.words),
            RemoteDocument::History(_) => None,
        }
    }

    /// Stored history for an account, if the document exists.
    pub fn history(&self, account_id: &str) -> Option<Vec<HistoryEntry>> {
        match self.document(account_id, DocKind::History)? {
            RemoteDocument::History(doc) => Some(doc.items),
            RemoteDocument::Favorites(_) => None,
        }
    }

    fn document(&self, account_id: &str, kind: DocKind) -> Option<RemoteDocument> {
        self.docs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(account_id.to_string(), kind))
            .cloned()
    }

    fn check_writes(&self) -> Result<(), RemoteError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn get(
        &self,
        account_id: &str,
        kind: DocKind,
    ) -> Result<Option<RemoteDocument>, RemoteError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("reads disabled".to_string()));
        }
        Ok(self.document(account_id, kind))
    }

    async fn set(&self, account_id: &str, doc: RemoteDocument) -> Result<(), RemoteError> {
        self.check_writes()?;
        let mut docs = self.docs.write().unwrap_or_else(|e| e.into_inner());
        docs.insert((account_id.to_string(), doc.kind()), doc);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn commit_batch(
        &self,
        account_id: &str,
        docs: Vec<RemoteDocument>,
    ) -> Result<(), RemoteError> {
        self.check_writes()?;
        let mut stored = self.docs.write().unwrap_or_else(|e| e.into_inner());
        for doc in docs {
            stored.insert((account_id.to_string(), doc.kind()), doc);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accounts_are_isolated() {
        let remote = MemoryRemoteStore::new();
        remote
            .set("u1", RemoteDocument::favorites(vec!["cat".into()]))
            .await
            .unwrap();

        assert_eq!(remote.favorites("u1"), Some(vec!["cat".to_string()]));
        assert_eq!(remote.favorites("u2"), None);
    }

    #[tokio::test]
    async fn test_batch_writes_all_documents_once() {
        let remote = MemoryRemoteStore::new();
        remote
            .commit_batch(
                "u1",
                vec![
                    RemoteDocument::favorites(vec!["cat".into()]),
                    RemoteDocument::history(vec![HistoryEntry::new("cat", 1)]),
                ],
            )
            .await
            .unwrap();

        assert_eq!(remote.write_count(), 1);
        assert!(remote.favorites("u1").is_some());
        assert_eq!(remote.history("u1").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_batch_writes_nothing() {
        let remote = MemoryRemoteStore::new();
        remote.set_fail_writes(true);

        let result = remote
            .commit_batch("u1", vec![RemoteDocument::favorites(vec!["cat".into()])])
            .await;

        assert!(result.is_err());
        assert!(remote.favorites("u1").is_none());
        assert_eq!(remote.write_count(), 0);
    }

    #[tokio::test]
    async fn test_fail_reads() {
        let remote = MemoryRemoteStore::new();
        remote.set_fail_reads(true);
        assert!(remote.get("u1", DocKind::History).await.is_err());
    }
}
