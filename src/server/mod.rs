//! Server-side modules for the Wordbook document server.

pub mod storage;

pub use storage::{AccountStorage, ServerStorageError};
