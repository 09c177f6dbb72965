mod definition;
mod documents;
mod history;

pub use definition::{Definition, Meaning, Phonetic, WordDefinition};
pub use documents::{FavoritesDocument, HistoryDocument};
pub use history::HistoryEntry;
