//! Shared state for CLI commands: local store, reconciler and the persisted
//! session.

use async_trait::async_trait;
use std::sync::Arc;
use wordbook::config::Config;
use wordbook::db::{init_db, SqliteKvStore};
use wordbook_core::{
    DocKind, HttpRemoteStore, LocalStore, LocalStoreError, Reconciler, RemoteDocument,
    RemoteError, RemoteStore, Session,
};

/// Local key holding the logged-in account id. Owned by the CLI; the
/// reconciler never reads it.
pub const SESSION_KEY: &str = "wordbook:session";

/// Remote store used when no server is configured. Every call fails, so an
/// authenticated session degrades to local-only data.
#[derive(Debug, Default)]
pub struct OfflineRemote;

#[async_trait]
impl RemoteStore for OfflineRemote {
    async fn get(&self, _: &str, _: DocKind) -> Result<Option<RemoteDocument>, RemoteError> {
        Err(not_configured())
    }

    async fn set(&self, _: &str, _: RemoteDocument) -> Result<(), RemoteError> {
        Err(not_configured())
    }

    async fn commit_batch(&self, _: &str, _: Vec<RemoteDocument>) -> Result<(), RemoteError> {
        Err(not_configured())
    }
}

fn not_configured() -> RemoteError {
    RemoteError::Unavailable("remote server not configured".to_string())
}

pub struct AppContext {
    pub store: SqliteKvStore,
    pub reconciler: Reconciler,
    pub remote: Option<HttpRemoteStore>,
    pub session: Session,
}

impl AppContext {
    pub async fn open(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let pool = init_db(&config.database_path.value).await?;
        let store = SqliteKvStore::new(pool);

        let remote = match (&config.remote.server_url, &config.remote.api_key) {
            (Some(url), Some(key)) => Some(HttpRemoteStore::new(url.clone(), key.clone())),
            _ => None,
        };
        let remote_store: Arc<dyn RemoteStore> = match &remote {
            Some(http) => Arc::new(http.clone()),
            None => Arc::new(OfflineRemote),
        };

        let reconciler = Reconciler::new(Arc::new(store.clone()), remote_store);
        let session = load_session(&store).await?;

        Ok(Self {
            store,
            reconciler,
            remote,
            session,
        })
    }

    /// Persists `session` as the current one.
    pub async fn save_session(&mut self, session: Session) -> Result<(), LocalStoreError> {
        match session.account_id() {
            Some(account_id) => self.store.set(SESSION_KEY, account_id).await?,
            None => {
                self.store.delete(SESSION_KEY).await?;
            }
        }
        self.session = session;
        Ok(())
    }
}

async fn load_session(store: &SqliteKvStore) -> Result<Session, LocalStoreError> {
    let mut session = Session::anonymous();
    session.set_user_id(store.get(SESSION_KEY).await?);
    Ok(session)
}
