//! Remote per-account document store.
//!
//! Each account holds two documents, favorites and history. Backends
//! implement [`RemoteStore`]; the reconciler only sees the trait object.

mod http;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RemoteError;
use crate::models::{FavoritesDocument, HistoryDocument, HistoryEntry};

pub use http::HttpRemoteStore;
pub use memory::MemoryRemoteStore;

/// Which per-account document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocKind {
    Favorites,
    History,
}

impl DocKind {
    pub fn name(&self) -> &'static str {
        match self {
            DocKind::Favorites => "favorites",
            DocKind::History => "history",
        }
    }

    /// Parse from string name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "favorites" => Some(DocKind::Favorites),
            "history" => Some(DocKind::History),
            _ => None,
        }
    }
}

/// A remote document tagged with its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "document", rename_all = "lowercase")]
pub enum RemoteDocument {
    Favorites(FavoritesDocument),
    History(HistoryDocument),
}

impl RemoteDocument {
    pub fn favorites(words: Vec<String>) -> Self {
        RemoteDocument::Favorites(FavoritesDocument::new(words))
    }

    pub fn history(items: Vec<HistoryEntry>) -> Self {
        RemoteDocument::History(HistoryDocument::new(items))
    }

    pub fn kind(&self) -> DocKind {
        match self {
            RemoteDocument::Favorites(_) => DocKind::Favorites,
            RemoteDocument::History(_) => DocKind::History,
        }
    }
}

/// Read/write/batch-write access to the per-account documents.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Returns `Ok(None)` if the account has no such document yet.
    async fn get(
        &self,
        account_id: &str,
        kind: DocKind,
    ) -> Result<Option<RemoteDocument>, RemoteError>;

    /// Replaces one document.
    async fn set(&self, account_id: &str, doc: RemoteDocument) -> Result<(), RemoteError>;

    /// Replaces several documents atomically: all are written or none are.
    async fn commit_batch(
        &self,
        account_id: &str,
        docs: Vec<RemoteDocument>,
    ) -> Result<(), RemoteError>;
}

/// Reads the account's favorite words, treating a missing document as empty.
pub async fn fetch_favorites(
    remote: &dyn RemoteStore,
    account_id: &str,
) -> Result<Vec<String>, RemoteError> {
    match remote.get(account_id, DocKind::Favorites).await? {
        Some(RemoteDocument::Favorites(doc)) => Ok(doc.words),
        Some(other) => Err(unexpected(DocKind::Favorites, &other)),
        None => Ok(Vec::new()),
    }
}

/// Reads the account's history, treating a missing document as empty.
pub async fn fetch_history(
    remote: &dyn RemoteStore,
    account_id: &str,
) -> Result<Vec<HistoryEntry>, RemoteError> {
    match remote.get(account_id, DocKind::History).await? {
        Some(RemoteDocument::History(doc)) => Ok(doc.items),
        Some(other) => Err(unexpected(DocKind::History, &other)),
        None => Ok(Vec::new()),
    }
}

fn unexpected(wanted: DocKind, got: &RemoteDocument) -> RemoteError {
    RemoteError::Decode(format!(
        "expected {} document, got {}",
        wanted.name(),
        got.kind().name()
    ))
}
