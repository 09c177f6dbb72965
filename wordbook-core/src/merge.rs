//! Pure merge rules for favorites and history.
//!
//! Favorites merge as an order-preserving set union (local words first).
//! History merges per word, keeping the most recent `viewed_at`, then sorts
//! newest-first and keeps at most [`HISTORY_LIMIT`] entries.

use std::collections::{HashMap, HashSet};

use crate::models::HistoryEntry;

/// Maximum number of history entries kept anywhere.
pub const HISTORY_LIMIT: usize = 100;

/// Union of local and remote favorites, duplicates removed, local order first.
pub fn merge_favorites(local: &[String], remote: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(local.len() + remote.len());
    local
        .iter()
        .chain(remote.iter())
        .filter(|w| seen.insert(w.as_str()))
        .cloned()
        .collect()
}

/// Whether a merged favorites list carries anything the remote copy lacks.
///
/// The merge is a superset of the remote set, so a size comparison against
/// the distinct remote words is an exact membership test.
pub fn favorites_need_write_back(merged: &[String], remote: &[String]) -> bool {
    let distinct_remote: HashSet<&str> = remote.iter().map(String::as_str).collect();
    merged.len() > distinct_remote.len()
}

/// Per-word latest-wins merge of two histories.
///
/// On equal timestamps the entry seen first (local) is kept.
pub fn merge_history(
    local: &[HistoryEntry],
    remote: &[HistoryEntry],
    limit: usize,
) -> Vec<HistoryEntry> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut merged: Vec<HistoryEntry> = Vec::with_capacity(local.len() + remote.len());

    for entry in local.iter().chain(remote.iter()) {
        match index.get(entry.word.as_str()) {
            Some(&i) => {
                if entry.viewed_at > merged[i].viewed_at {
                    merged[i].viewed_at = entry.viewed_at;
                }
            }
            None => {
                index.insert(entry.word.as_str(), merged.len());
                merged.push(entry.clone());
            }
        }
    }

    sort_and_truncate(merged, limit)
}

/// Whether the merged history differs from what the remote holds.
pub fn history_needs_write_back(merged: &[HistoryEntry], remote: &[HistoryEntry]) -> bool {
    merged != remote
}

/// Record a view of `word` at `now`: update or insert, move to front, truncate.
pub fn record_view(
    history: Vec<HistoryEntry>,
    word: &str,
    now: i64,
    limit: usize,
) -> Vec<HistoryEntry> {
    let mut updated = Vec::with_capacity(history.len() + 1);
    updated.push(HistoryEntry::new(word, now));
    updated.extend(history.into_iter().filter(|e| e.word != word));
    updated.truncate(limit);
    updated
}

fn sort_and_truncate(mut entries: Vec<HistoryEntry>, limit: usize) -> Vec<HistoryEntry> {
    // Stable: ties keep first-seen order.
    entries.sort_by(|a, b| b.viewed_at.cmp(&a.viewed_at));
    entries.truncate(limit);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_merge_favorites_union_in_order() {
        let merged = merge_favorites(&words(&["cat", "dog"]), &words(&["dog", "fox"]));
        assert_eq!(merged, words(&["cat", "dog", "fox"]));
    }

    #[test]
    fn test_merge_favorites_removes_duplicates_within_one_side() {
        let merged = merge_favorites(&words(&["cat", "cat"]), &words(&["fox", "fox"]));
        assert_eq!(merged, words(&["cat", "fox"]));
    }

    #[test]
    fn test_merge_favorites_empty_sides() {
        assert!(merge_favorites(&[], &[]).is_empty());
        assert_eq!(merge_favorites(&[], &words(&["a"])), words(&["a"]));
        assert_eq!(merge_favorites(&words(&["a"]), &[]), words(&["a"]));
    }

    #[test]
    fn test_merge_favorites_is_set_union() {
        let local = words(&["a", "b", "c", "b"]);
        let remote = words(&["c", "d", "a", "e"]);
        let merged = merge_favorites(&local, &remote);

        let expected: HashSet<&str> = ["a", "b", "c", "d", "e"].into_iter().collect();
        let actual: HashSet<&str> = merged.iter().map(String::as_str).collect();
        assert_eq!(actual, expected);
        assert_eq!(merged.len(), expected.len());
    }

    #[test]
    fn test_favorites_write_back_only_when_merge_adds() {
        let remote = words(&["dog", "fox"]);
        let merged = merge_favorites(&words(&["cat", "dog"]), &remote);
        assert!(favorites_need_write_back(&merged, &remote));

        let merged = merge_favorites(&words(&["fox"]), &remote);
        assert!(!favorites_need_write_back(&merged, &remote));
    }

    #[test]
    fn test_favorites_write_back_ignores_remote_duplicates() {
        let remote = words(&["dog", "dog"]);
        let merged = merge_favorites(&words(&["dog"]), &remote);
        assert!(!favorites_need_write_back(&merged, &remote));
    }

    #[test]
    fn test_merge_history_latest_wins() {
        let local = vec![HistoryEntry::new("cat", 100)];
        let remote = vec![HistoryEntry::new("cat", 200), HistoryEntry::new("dog", 50)];

        let merged = merge_history(&local, &remote, HISTORY_LIMIT);
        assert_eq!(
            merged,
            vec![HistoryEntry::new("cat", 200), HistoryEntry::new("dog", 50)]
        );
    }

    #[test]
    fn test_merge_history_local_newer_wins() {
        let local = vec![HistoryEntry::new("word1", 3000)];
        let remote = vec![HistoryEntry::new("word1", 1000)];

        let merged = merge_history(&local, &remote, HISTORY_LIMIT);
        assert_eq!(merged, vec![HistoryEntry::new("word1", 3000)]);
    }

    #[test]
    fn test_merge_history_sorted_descending() {
        let local = vec![HistoryEntry::new("a", 1), HistoryEntry::new("b", 30)];
        let remote = vec![HistoryEntry::new("c", 20), HistoryEntry::new("d", 40)];

        let merged = merge_history(&local, &remote, HISTORY_LIMIT);
        let order: Vec<&str> = merged.iter().map(|e| e.word.as_str()).collect();
        assert_eq!(order, vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_merge_history_truncates_to_limit() {
        let local: Vec<HistoryEntry> = (0..60)
            .map(|i| HistoryEntry::new(format!("word{}", i), i * 1000))
            .collect();
        let remote: Vec<HistoryEntry> = (60..120)
            .map(|i| HistoryEntry::new(format!("word{}", i), i * 1000))
            .collect();

        let merged = merge_history(&local, &remote, HISTORY_LIMIT);
        assert_eq!(merged.len(), HISTORY_LIMIT);
        assert_eq!(merged[0].word, "word119");
        assert_eq!(merged[99].word, "word20");
    }

    #[test]
    fn test_merge_history_one_entry_per_word() {
        let local = vec![HistoryEntry::new("a", 5), HistoryEntry::new("a", 9)];
        let remote = vec![HistoryEntry::new("a", 7)];

        let merged = merge_history(&local, &remote, HISTORY_LIMIT);
        assert_eq!(merged, vec![HistoryEntry::new("a", 9)]);
    }

    #[test]
    fn test_history_write_back_detects_same_size_changes() {
        let remote = vec![HistoryEntry::new("cat", 100)];
        let merged = merge_history(&[HistoryEntry::new("cat", 500)], &remote, HISTORY_LIMIT);
        assert_eq!(merged.len(), remote.len());
        assert!(history_needs_write_back(&merged, &remote));

        let merged = merge_history(&[], &remote, HISTORY_LIMIT);
        assert!(!history_needs_write_back(&merged, &remote));
    }

    #[test]
    fn test_record_view_inserts_at_front() {
        let history = vec![HistoryEntry::new("dog", 10)];
        let updated = record_view(history, "cat", 20, HISTORY_LIMIT);
        assert_eq!(
            updated,
            vec![HistoryEntry::new("cat", 20), HistoryEntry::new("dog", 10)]
        );
    }

    #[test]
    fn test_record_view_moves_existing_to_front() {
        let history = vec![
            HistoryEntry::new("dog", 30),
            HistoryEntry::new("cat", 20),
            HistoryEntry::new("fox", 10),
        ];
        let updated = record_view(history, "cat", 40, HISTORY_LIMIT);
        assert_eq!(updated.len(), 3);
        assert_eq!(updated[0], HistoryEntry::new("cat", 40));
        assert_eq!(updated[1].word, "dog");
        assert_eq!(updated[2].word, "fox");
    }

    #[test]
    fn test_record_view_evicts_oldest_beyond_limit() {
        let history: Vec<HistoryEntry> = (0..3)
            .rev()
            .map(|i| HistoryEntry::new(format!("w{}", i), i))
            .collect();
        let updated = record_view(history, "new", 10, 3);
        let order: Vec<&str> = updated.iter().map(|e| e.word.as_str()).collect();
        assert_eq!(order, vec!["new", "w2", "w1"]);
    }
}
