use serde::{Deserialize, Serialize};
use std::fmt;

/// A dictionary record as returned by the definition lookup API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordDefinition {
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    #[serde(default)]
    pub phonetics: Vec<Phonetic>,
    #[serde(default)]
    pub meanings: Vec<Meaning>,
    #[serde(default)]
    pub source_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phonetic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meaning {
    pub part_of_speech: String,
    #[serde(default)]
    pub definitions: Vec<Definition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub antonyms: Vec<String>,
}

impl WordDefinition {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            phonetic: None,
            phonetics: Vec::new(),
            meanings: Vec::new(),
            source_urls: Vec::new(),
        }
    }

    pub fn with_meaning(mut self, part_of_speech: impl Into<String>, definition: &str) -> Self {
        self.meanings.push(Meaning {
            part_of_speech: part_of_speech.into(),
            definitions: vec![Definition {
                definition: definition.to_string(),
                example: None,
                synonyms: Vec::new(),
                antonyms: Vec::new(),
            }],
        });
        self
    }

    /// First pronunciation audio URL, if any phonetic carries one.
    pub fn audio_url(&self) -> Option<&str> {
        self.phonetics
            .iter()
            .filter_map(|p| p.audio.as_deref())
            .find(|a| !a.is_empty())
    }

    /// Phonetic text, falling back to the first phonetic entry with text.
    pub fn phonetic_text(&self) -> Option<&str> {
        self.phonetic
            .as_deref()
            .or_else(|| self.phonetics.iter().find_map(|p| p.text.as_deref()))
    }
}

impl fmt::Display for WordDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.word)?;
        if let Some(phonetic) = self.phonetic_text() {
            write!(f, "  {}", phonetic)?;
        }
        writeln!(f)?;
        writeln!(f, "{}", "=".repeat(30))?;

        for meaning in &self.meanings {
            writeln!(f, "\n{}", meaning.part_of_speech)?;
            for (i, def) in meaning.definitions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, def.definition)?;
                if let Some(example) = &def.example {
                    writeln!(f, "     e.g. \"{}\"", example)?;
                }
                if !def.synonyms.is_empty() {
                    writeln!(f, "     synonyms: {}", def.synonyms.join(", "))?;
                }
            }
        }

        if let Some(audio) = self.audio_url() {
            writeln!(f, "\nAudio: {}", audio)?;
        }

        Ok(())
    }
}
