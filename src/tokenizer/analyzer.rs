use rust_stemmers::Stemmer;
use std::collections::HashSet;
use std::fmt;
use stop_words::get;
use unicode_segmentation::{UWordBoundIndices, UnicodeSegmentation};

use crate::config::AnalyzerConfig;
use crate::schema::Language;

/// A single analyzed term and where it came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub term: String,
    /// Ordinal of the source word; filtered words still consume a position
    pub position: u32,
    /// Byte offset of the source word
    pub start: usize,
    /// Byte offset one past the end of the source word
    pub end: usize,
}

/// Language-aware text analyzer with stemming and stopword removal
///
/// An analyzer built without a language is the neutral analyzer: words are
/// split and lowercased, nothing is removed or stemmed.
pub struct Analyzer {
    config: AnalyzerConfig,
    language: Option<Language>,
    stemmer: Option<Stemmer>,
    stopwords: HashSet<String>,
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("language", &self.language)
            .field("stem", &self.stemmer.is_some())
            .field("stopwords", &self.stopwords.len())
            .finish()
    }
}

impl Analyzer {
    /// Create an analyzer for the given language
    pub fn new(config: &AnalyzerConfig, language: Option<Language>) -> Self {
        let stemmer = match language {
            Some(lang) if config.stem => Some(Stemmer::create(lang.stemmer_algorithm())),
            _ => None,
        };

        let stopwords = match language {
            Some(lang) if config.remove_stopwords => get(lang.stopword_language())
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect(),
            _ => HashSet::new(),
        };

        Self {
            config: config.clone(),
            language,
            stemmer,
            stopwords,
        }
    }

    /// Analyzer with no stemming and no stopwords
    pub fn neutral(config: &AnalyzerConfig) -> Self {
        Self::new(config, None)
    }

    pub fn language(&self) -> Option<Language> {
        self.language
    }

    /// Analyze text into a lazy stream of tokens
    pub fn analyze<'a>(&'a self, text: &'a str) -> TokenStream<'a> {
        TokenStream {
            analyzer: self,
            words: text.split_word_bound_indices(),
            position: 0,
        }
    }

    /// Analyze text and collect the terms in order
    pub fn terms(&self, text: &str) -> Vec<String> {
        self.analyze(text).map(|t| t.term).collect()
    }

    /// Normalize a single query word; `None` when the word is filtered out
    pub fn normalize(&self, word: &str) -> Option<String> {
        let mut term = if self.config.lowercase {
            word.to_lowercase()
        } else {
            word.to_string()
        };

        let len = term.chars().count();
        if len < self.config.min_token_length || len > self.config.max_token_length {
            return None;
        }

        if self.stopwords.contains(&term) {
            return None;
        }

        if let Some(stemmer) = &self.stemmer {
            term = stemmer.stem(&term).to_string();
        }

        Some(term)
    }
}

/// Restartable token iterator returned by [`Analyzer::analyze`]
///
/// Cloning the stream yields an independent iterator positioned at the same
/// place, so a caller can walk the same text more than once.
#[derive(Clone)]
pub struct TokenStream<'a> {
    analyzer: &'a Analyzer,
    words: UWordBoundIndices<'a>,
    position: u32,
}

impl<'a> Iterator for TokenStream<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        for (start, word) in self.words.by_ref() {
            if !word.chars().any(char::is_alphanumeric) {
                continue;
            }

            let position = self.position;
            self.position += 1;

            if let Some(term) = self.analyzer.normalize(word) {
                return Some(Token {
                    term,
                    position,
                    start,
                    end: start + word.len(),
                });
            }
        }
        None
    }
}

/// Lowercased, unstemmed words of a text
pub fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.unicode_words().map(|w| w.to_lowercase())
}
