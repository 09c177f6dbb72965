//! Server-side per-account document storage.
//!
//! Stores documents per account in the following structure:
//! ```text
//! <DATA_DIR>/
//!   <account_id>/
//!     favorites.json
//!     history.json
//! ```
//!
//! Every write goes to a temp file that is then renamed over the target.
//! The replaced document is kept as `<kind>.json.bak` until the whole batch
//! is in place. Callers serialize writers (see `wordbook-server`).

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use wordbook_core::{DocKind, FavoritesDocument, HistoryDocument, RemoteDocument};

/// Returns the filename for a document kind.
pub fn filename(kind: DocKind) -> &'static str {
    match kind {
        DocKind::Favorites => "favorites.json",
        DocKind::History => "history.json",
    }
}

/// Errors that can occur during server storage operations.
#[derive(Debug)]
pub enum ServerStorageError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// Stored or submitted document is not valid JSON for its kind.
    JsonError(PathBuf, serde_json::Error),
    /// Invalid account ID (e.g., contains path separators).
    InvalidAccountId(String),
    /// Invalid document kind.
    InvalidDocKind(String),
    /// Batch names the same document kind twice.
    DuplicateInBatch(DocKind),
}

impl std::fmt::Display for ServerStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerStorageError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            ServerStorageError::JsonError(path, e) => {
                write!(f, "Invalid document {}: {}", path.display(), e)
            }
            ServerStorageError::InvalidAccountId(id) => {
                write!(f, "Invalid account ID: {}", id)
            }
            ServerStorageError::InvalidDocKind(kind) => {
                write!(f, "Invalid document kind: {}", kind)
            }
            ServerStorageError::DuplicateInBatch(kind) => {
                write!(f, "Batch contains more than one {} document", kind.name())
            }
        }
    }
}

impl std::error::Error for ServerStorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerStorageError::IoError(_, e) => Some(e),
            ServerStorageError::JsonError(_, e) => Some(e),
            _ => None,
        }
    }
}

/// File-backed storage for per-account documents.
#[derive(Debug, Clone)]
pub struct AccountStorage {
    data_dir: PathBuf,
}

impl AccountStorage {
    /// Creates a new storage instance rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Validates an account ID to prevent path traversal attacks.
    pub fn validate_account_id(account_id: &str) -> Result<(), ServerStorageError> {
        if account_id.is_empty()
            || account_id.contains('/')
            || account_id.contains('\\')
            || account_id.contains("..")
            || account_id.starts_with('.')
        {
            return Err(ServerStorageError::InvalidAccountId(account_id.to_string()));
        }
        Ok(())
    }

    fn account_dir(&self, account_id: &str) -> PathBuf {
        self.data_dir.join(account_id)
    }

    fn doc_path(&self, account_id: &str, kind: DocKind) -> PathBuf {
        self.account_dir(account_id).join(filename(kind))
    }

    /// Loads a document for an account.
    ///
    /// Returns `Ok(None)` if the document doesn't exist yet.
    pub fn load(
        &self,
        account_id: &str,
        kind: DocKind,
    ) -> Result<Option<RemoteDocument>, ServerStorageError> {
        Self::validate_account_id(account_id)?;

        let path = self.doc_path(account_id, kind);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ServerStorageError::IoError(path, e)),
        };

        decode(kind, &bytes)
            .map(Some)
            .map_err(|e| ServerStorageError::JsonError(path, e))
    }

    /// Loads a document by kind name.
    pub fn load_by_name(
        &self,
        account_id: &str,
        kind: &str,
    ) -> Result<Option<RemoteDocument>, ServerStorageError> {
        let kind = DocKind::parse(kind)
            .ok_or_else(|| ServerStorageError::InvalidDocKind(kind.to_string()))?;
        self.load(account_id, kind)
    }

    /// Replaces one document.
    pub fn save(&self, account_id: &str, doc: &RemoteDocument) -> Result<(), ServerStorageError> {
        self.commit_batch(account_id, std::slice::from_ref(doc))
    }

    /// Replaces several documents so that either all of them change or none.
    ///
    /// Every document is first written to a temp file next to its target.
    /// If any staging step fails the temp files are removed and nothing is
    /// replaced. Only then are the temp files renamed into place, each old
    /// document moving to a backup first. If a rename fails, the documents
    /// already replaced are restored from their backups.
    ///
    /// A crash during the rename phase can still leave the batch applied in
    /// part, with the old documents left behind as `.bak` files.
    pub fn commit_batch(
        &self,
        account_id: &str,
        docs: &[RemoteDocument],
    ) -> Result<(), ServerStorageError> {
        Self::validate_account_id(account_id)?;

        let mut kinds = Vec::with_capacity(docs.len());
        for doc in docs {
            if kinds.contains(&doc.kind()) {
                return Err(ServerStorageError::DuplicateInBatch(doc.kind()));
            }
            kinds.push(doc.kind());
        }
        if docs.is_empty() {
            return Ok(());
        }

        let account_dir = self.account_dir(account_id);
        fs::create_dir_all(&account_dir)
            .map_err(|e| ServerStorageError::IoError(account_dir.clone(), e))?;

        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(docs.len());
        for doc in docs {
            let path = self.doc_path(account_id, doc.kind());
            let temp_path = path.with_extension("json.tmp");
            if let Err(e) = stage(&temp_path, doc) {
                discard(&temp_path);
                for (temp, _) in &staged {
                    discard(temp);
                }
                return Err(e);
            }
            staged.push((temp_path, path));
        }

        let mut replaced: Vec<(&Path, Option<PathBuf>)> = Vec::with_capacity(staged.len());
        for (i, (temp_path, path)) in staged.iter().enumerate() {
            match swap_in(temp_path, path) {
                Ok(backup) => replaced.push((path.as_path(), backup)),
                Err(e) => {
                    for (temp, _) in &staged[i..] {
                        discard(temp);
                    }
                    roll_back(&replaced);
                    return Err(e);
                }
            }
        }

        for backup in replaced.iter().filter_map(|(_, backup)| backup.as_deref()) {
            discard(backup);
        }

        Ok(())
    }

    /// Checks if a document exists for an account.
    pub fn exists(&self, account_id: &str, kind: DocKind) -> Result<bool, ServerStorageError> {
        Self::validate_account_id(account_id)?;
        Ok(self.doc_path(account_id, kind).exists())
    }
}

/// Decodes the stored body of a document of the given kind.
pub fn decode(kind: DocKind, bytes: &[u8]) -> Result<RemoteDocument, serde_json::Error> {
    Ok(match kind {
        DocKind::Favorites => {
            RemoteDocument::Favorites(serde_json::from_slice::<FavoritesDocument>(bytes)?)
        }
        DocKind::History => {
            RemoteDocument::History(serde_json::from_slice::<HistoryDocument>(bytes)?)
        }
    })
}

/// Serializes the body of a document (without the kind tag).
pub fn encode(doc: &RemoteDocument) -> Result<Vec<u8>, serde_json::Error> {
    match doc {
        RemoteDocument::Favorites(d) => serde_json::to_vec(d),
        RemoteDocument::History(d) => serde_json::to_vec(d),
    }
}

fn stage(temp_path: &Path, doc: &RemoteDocument) -> Result<(), ServerStorageError> {
    let bytes =
        encode(doc).map_err(|e| ServerStorageError::JsonError(temp_path.to_path_buf(), e))?;
    let io_err = |e| ServerStorageError::IoError(temp_path.to_path_buf(), e);

    let mut file = File::create(temp_path).map_err(io_err)?;
    file.write_all(&bytes).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    Ok(())
}

/// Renames `temp_path` over `path`, moving any existing document to a backup.
///
/// Returns the backup path when there was a document to replace.
fn swap_in(temp_path: &Path, path: &Path) -> Result<Option<PathBuf>, ServerStorageError> {
    let backup_path = path.with_extension("json.bak");
    let backup = match fs::rename(path, &backup_path) {
        Ok(()) => Some(backup_path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(ServerStorageError::IoError(path.to_path_buf(), e)),
    };

    if let Err(e) = fs::rename(temp_path, path) {
        roll_back(&[(path, backup)]);
        return Err(ServerStorageError::IoError(path.to_path_buf(), e));
    }
    Ok(backup)
}

/// Puts back the documents replaced so far, newest first.
fn roll_back(replaced: &[(&Path, Option<PathBuf>)]) {
    for (path, backup) in replaced.iter().rev() {
        match backup {
            Some(backup) => {
                if let Err(e) = fs::rename(backup, path) {
                    tracing::error!(
                        "Failed to restore {} from {}: {}",
                        path.display(),
                        backup.display(),
                        e
                    );
                }
            }
            None => discard(path),
        }
    }
}

fn discard(temp_path: &Path) {
    if let Err(e) = fs::remove_file(temp_path) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove {}: {}", temp_path.display(), e);
        }
    }
}
