//! Field type definitions
//!
//! Defines how each field of a wiki document is indexed and stored.

use rust_stemmers::Algorithm;
use serde::{Deserialize, Serialize};
use std::fmt;
use stop_words::LANGUAGE;

/// Languages with a dedicated analyzer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Italian,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Italian];

    /// Parse a declared language tag (`en`, `english`, `it`, `italian`)
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "en" | "eng" | "english" => Some(Language::English),
            "it" | "ita" | "italian" => Some(Language::Italian),
            _ => None,
        }
    }

    /// Short tag used in field names and API responses
    pub fn tag(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Italian => "it",
        }
    }

    pub fn stemmer_algorithm(&self) -> Algorithm {
        match self {
            Language::English => Algorithm::English,
            Language::Italian => Algorithm::Italian,
        }
    }

    pub fn stopword_language(&self) -> LANGUAGE {
        match self {
            Language::English => LANGUAGE::English,
            Language::Italian => LANGUAGE::Italian,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Field kind
///
/// Determines how a field is indexed, stored, and queried.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Unique key, stored verbatim and never tokenized
    Id,

    /// Character n-grams of the whole value, for substring lookups
    Ngram { min_gram: usize, max_gram: usize },

    /// Stored only, not searchable
    Stored,

    /// Full-text field analyzed with the given language.
    ///
    /// When `spelling` is set the field keeps an unstemmed vocabulary that the
    /// spelling corrector draws suggestions from.
    Text { language: Language, spelling: bool },
}

impl FieldKind {
    /// Whether the field produces postings
    pub fn is_indexed(&self) -> bool {
        matches!(self, FieldKind::Ngram { .. } | FieldKind::Text { .. })
    }

    pub fn language(&self) -> Option<Language> {
        match self {
            FieldKind::Text { language, .. } => Some(*language),
            _ => None,
        }
    }

    pub fn has_spelling(&self) -> bool {
        matches!(self, FieldKind::Text { spelling: true, .. })
    }

    /// Short description used in schema mismatch messages
    pub fn describe(&self) -> String {
        match self {
            FieldKind::Id => "id".to_string(),
            FieldKind::Ngram { min_gram, max_gram } => format!("ngram({}..{})", min_gram, max_gram),
            FieldKind::Stored => "stored".to_string(),
            FieldKind::Text { language, spelling } => {
                if *spelling {
                    format!("text({},spelling)", language)
                } else {
                    format!("text({})", language)
                }
            }
        }
    }
}
