//! Wordbook Core Library
//!
//! Favorites/history reconciliation between on-device storage and a remote
//! per-account document store, plus the in-memory definition cache.

pub mod cache;
pub mod clock;
pub mod error;
pub mod merge;
pub mod models;
pub mod reconciler;
pub mod remote;
pub mod session;
pub mod store;

pub use cache::{CachedLookup, DefinitionCache, DefinitionSource, DEFAULT_TTL};
pub use clock::{Clock, SystemClock};
pub use error::{LocalStoreError, ReconcileError, RemoteError};
pub use merge::HISTORY_LIMIT;
pub use models::{
    Definition, FavoritesDocument, HistoryDocument, HistoryEntry, Meaning, Phonetic,
    WordDefinition,
};
pub use reconciler::{Reconciler, UserData};
pub use remote::{DocKind, HttpRemoteStore, MemoryRemoteStore, RemoteDocument, RemoteStore};
pub use session::{login, logout, Session};
pub use store::{LocalStore, MemoryLocalStore, StorageKey};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
