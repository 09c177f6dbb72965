use serde::{Deserialize, Serialize};
use std::fmt;

/// One viewed word and when it was last viewed (epoch milliseconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub word: String,
    #[serde(rename = "viewedAt", default)]
    pub viewed_at: i64,
}

impl HistoryEntry {
    pub fn new(word: impl Into<String>, viewed_at: i64) -> Self {
        Self {
            word: word.into(),
            viewed_at,
        }
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match chrono::DateTime::from_timestamp_millis(self.viewed_at) {
            Some(at) => write!(f, "{} ({})", self.word, at.format("%Y-%m-%d %H:%M")),
            None => write!(f, "{}", self.word),
        }
    }
}
