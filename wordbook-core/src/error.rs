//! Error types shared by the stores and the reconciler.

use thiserror::Error;

/// Failures of the on-device key-value store.
#[derive(Error, Debug)]
pub enum LocalStoreError {
    #[error("Local storage I/O error: {0}")]
    Io(String),

    #[error("Local database error: {0}")]
    Database(String),

    #[error("Failed to (de)serialize value for '{key}': {source}")]
    Serialization {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures of the remote per-account document store.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Server returned status {0}")]
    Status(u16),

    #[error("Failed to decode remote document: {0}")]
    Decode(String),

    #[error("Remote store unavailable: {0}")]
    Unavailable(String),

    #[error("Batch commit failed: {0}")]
    BatchRejected(String),
}

/// Errors surfaced by the few reconciler operations that report an outcome.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error(transparent)]
    Local(#[from] LocalStoreError),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display() {
        assert_eq!(
            RemoteError::Status(503).to_string(),
            "Server returned status 503"
        );
    }

    #[test]
    fn test_reconcile_error_is_transparent() {
        let err: ReconcileError = RemoteError::Unavailable("offline".into()).into();
        assert_eq!(err.to_string(), "Remote store unavailable: offline");
    }
}
