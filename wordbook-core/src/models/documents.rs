//! Remote per-account documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::HistoryEntry;

/// Favorites document: `{ words, updatedAt }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesDocument {
    #[serde(default)]
    pub words: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl FavoritesDocument {
    pub fn new(words: Vec<String>) -> Self {
        Self {
            words,
            updated_at: Utc::now(),
        }
    }
}

/// History document: `{ items, updatedAt }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryDocument {
    #[serde(default)]
    pub items: Vec<HistoryEntry>,
    pub updated_at: DateTime<Utc>,
}

impl HistoryDocument {
    pub fn new(items: Vec<HistoryEntry>) -> Self {
        Self {
            items,
            updated_at: Utc::now(),
        }
    }
}
