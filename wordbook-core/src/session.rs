//! Session identity and the login/logout transitions.
//!
//! A [`Session`] is passed explicitly to every reconciler call. Only an
//! authenticated session makes the reconciler consult the remote store.

use crate::reconciler::{Reconciler, UserData};

/// The active account, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    account_id: Option<String>,
}

impl Session {
    /// Local-only mode.
    pub fn anonymous() -> Self {
        Self { account_id: None }
    }

    /// Remote-sync mode for `account_id`.
    pub fn authenticated(account_id: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id.into()),
        }
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.account_id.is_some()
    }

    /// Replaces the identity. Performs no I/O; callers run
    /// [`login`]/[`logout`] (or load/sync) around the transition.
    pub fn set_user_id(&mut self, account_id: Option<String>) {
        self.account_id = account_id.filter(|id| !id.is_empty());
    }
}

/// Absent -> present: one reconciliation pass for the new account.
pub async fn login(reconciler: &Reconciler, account_id: &str) -> (Session, UserData) {
    let session = Session::authenticated(account_id);
    tracing::info!(account = account_id, "logging in, reconciling with remote");
    let data = reconciler.load_from_remote(&session).await;
    (session, data)
}

/// Present -> absent: one best-effort flush of local state, then clear.
pub async fn logout(reconciler: &Reconciler, session: &Session) -> Session {
    if session.is_authenticated() {
        if let Err(e) = reconciler.sync_to_remote(session).await {
            tracing::warn!("Error syncing data before logout: {}", e);
        }
    }
    Session::anonymous()
}
