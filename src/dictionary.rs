//! Dictionary HTTP client: word definitions and the browsable word list.
//!
//! Definitions come from dictionaryapi.dev. The word list is the common-words
//! text file, falling back to the full dictionary JSON when that is missing
//! or empty.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use tokio::sync::Mutex;
use wordbook_core::{DefinitionSource, WordDefinition};

pub const API_BASE_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";

pub const COMMON_WORDS_URL: &str = "https://raw.githubusercontent.com/first20hours/google-10000-english/master/google-10000-english-usa-no-swears-medium.txt";

pub const WORDS_DICTIONARY_URL: &str =
    "https://raw.githubusercontent.com/dwyl/english-words/master/words_dictionary.json";

#[derive(Debug)]
pub enum DictionaryError {
    /// Request failed before a response arrived.
    Http(String),
    /// Server answered with an unexpected status.
    Status(u16),
    /// Response body could not be decoded.
    Decode(String),
}

impl std::fmt::Display for DictionaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DictionaryError::Http(e) => write!(f, "Dictionary request failed: {}", e),
            DictionaryError::Status(code) => write!(f, "Dictionary returned HTTP {}", code),
            DictionaryError::Decode(e) => write!(f, "Invalid dictionary response: {}", e),
        }
    }
}

impl std::error::Error for DictionaryError {}

/// Client for the definition API and the word-list sources.
#[derive(Debug)]
pub struct HttpDictionary {
    client: reqwest::Client,
    api_base_url: String,
    common_words_url: String,
    dictionary_url: String,
    words: Mutex<Option<Arc<Vec<String>>>>,
}

impl HttpDictionary {
    pub fn new() -> Self {
        Self::with_urls(API_BASE_URL, COMMON_WORDS_URL, WORDS_DICTIONARY_URL)
    }

    pub fn with_urls(
        api_base_url: impl Into<String>,
        common_words_url: impl Into<String>,
        dictionary_url: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base_url: api_base_url.into(),
            common_words_url: common_words_url.into(),
            dictionary_url: dictionary_url.into(),
            words: Mutex::new(None),
        }
    }

    /// Returns the word list, fetching it on first use.
    ///
    /// The common-words list is tried first; if it fails or yields no
    /// usable words the full dictionary is used. A successful result is kept
    /// until [`clear_words_cache`](Self::clear_words_cache).
    pub async fn fetch_words(&self) -> Result<Arc<Vec<String>>, DictionaryError> {
        let mut cached = self.words.lock().await;
        if let Some(words) = cached.as_ref() {
            return Ok(words.clone());
        }

        let words = match self.fetch_common_words().await {
            Ok(words) if !words.is_empty() => words,
            Ok(_) => {
                tracing::info!("Common words list is empty, trying full dictionary");
                self.fetch_dictionary_words().await?
            }
            Err(e) => {
                tracing::info!(
                    "Common words list not available ({}), trying full dictionary",
                    e
                );
                self.fetch_dictionary_words().await?
            }
        };

        let words = Arc::new(words);
        *cached = Some(words.clone());
        Ok(words)
    }

    pub async fn clear_words_cache(&self) {
        *self.words.lock().await = None;
    }

    async fn fetch_common_words(&self) -> Result<Vec<String>, DictionaryError> {
        let response = self.get(&self.common_words_url).await?;
        let text = response
            .text()
            .await
            .map_err(|e| DictionaryError::Decode(e.to_string()))?;
        Ok(parse_word_lines(&text))
    }

    async fn fetch_dictionary_words(&self) -> Result<Vec<String>, DictionaryError> {
        let response = self.get(&self.dictionary_url).await?;
        let map: serde_json::Map<String, serde_json::Value> = response
            .json()
            .await
            .map_err(|e| DictionaryError::Decode(e.to_string()))?;
        Ok(filter_words(map.keys().map(String::as_str)))
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, DictionaryError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DictionaryError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(DictionaryError::Status(response.status().as_u16()));
        }
        Ok(response)
    }
}

impl Default for HttpDictionary {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DefinitionSource for HttpDictionary {
    type Error = DictionaryError;

    async fn lookup(&self, word: &str) -> Result<Option<WordDefinition>, DictionaryError> {
        let url = format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            urlencoding::encode(word)
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DictionaryError::Http(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let entries: Vec<WordDefinition> = response
                    .json()
                    .await
                    .map_err(|e| DictionaryError::Decode(e.to_string()))?;
                Ok(entries.into_iter().next())
            }
            s => Err(DictionaryError::Status(s.as_u16())),
        }
    }
}

/// Splits a one-word-per-line list and keeps the usable words.
pub fn parse_word_lines(text: &str) -> Vec<String> {
    filter_words(text.lines())
}

/// Lowercases and trims, keeping words longer than two ASCII letters.
pub fn filter_words<'a>(words: impl Iterator<Item = &'a str>) -> Vec<String> {
    words
        .map(|w| w.trim().to_lowercase())
        .filter(|w| is_browsable_word(w))
        .collect()
}

fn is_browsable_word(word: &str) -> bool {
    word.len() > 2 && word.bytes().all(|b| b.is_ascii_lowercase())
}
