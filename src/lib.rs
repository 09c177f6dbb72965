//! Wordbook application library: configuration, local SQLite storage, the
//! dictionary client and the document server's storage layer.

pub mod config;
pub mod db;
pub mod dictionary;
pub mod server;
