//! Query spelling suggestions
//!
//! Each plain word of the query is checked against the spelling dictionaries
//! of the content fields. Unknown words are replaced by the closest known word,
//! preferring smaller edit distance, then higher frequency. Operators, field
//! prefixes, quotes and punctuation are copied through unchanged.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::SpellingConfig;
use crate::segment::{Searcher, SpellingDictionary};

/// Suggests corrected query strings from a searcher's vocabularies
pub struct SpellingCorrector<'a> {
    dictionaries: Vec<&'a SpellingDictionary>,
    config: &'a SpellingConfig,
}

impl<'a> SpellingCorrector<'a> {
    pub fn new(searcher: &'a Searcher) -> Self {
        let snapshot = searcher.snapshot();
        let dictionaries = searcher
            .analyzers()
            .spelling_fields()
            .iter()
            .filter_map(|field| snapshot.dictionary(field))
            .filter(|dict| !dict.is_empty())
            .collect();

        Self {
            dictionaries,
            config: &searcher.settings().spelling,
        }
    }

    /// Corrected query, or `None` when every word is known
    pub fn suggest(&self, query: &str) -> Option<String> {
        if self.dictionaries.is_empty() {
            return None;
        }

        let mut corrected = String::with_capacity(query.len());
        for segment in query.split_word_bounds() {
            match segment.split_once(':') {
                Some((prefix, rest)) if is_field_name(prefix) => {
                    corrected.push_str(prefix);
                    corrected.push(':');
                    corrected.push_str(&self.correct_word(rest));
                }
                _ => corrected.push_str(&self.correct_word(segment)),
            }
        }

        if corrected == query {
            None
        } else {
            debug!(query, suggestion = %corrected, "spelling suggestion");
            Some(corrected)
        }
    }

    fn correct_word(&self, word: &str) -> String {
        if !self.is_correctable(word) {
            return word.to_string();
        }

        let lower = word.to_lowercase();
        if self.dictionaries.iter().any(|dict| dict.contains(&lower)) {
            return word.to_string();
        }

        // Frequencies are summed across fields; the distance is the same in each
        let mut merged: BTreeMap<String, (usize, u64)> = BTreeMap::new();
        for dict in &self.dictionaries {
            for (candidate, distance, freq) in dict.candidates(&lower, self.config.max_distance) {
                let entry = merged.entry(candidate).or_insert((distance, 0));
                entry.1 += freq;
            }
        }

        merged
            .into_iter()
            .min_by_key(|(candidate, (distance, freq))| (*distance, Reverse(*freq), candidate.clone()))
            .map(|(candidate, _)| candidate)
            .unwrap_or_else(|| word.to_string())
    }

    fn is_correctable(&self, word: &str) -> bool {
        is_word(word)
            && word != "OR"
            && word != "AND"
            && word.chars().count() >= self.config.min_word_length
            && !word.chars().any(|c| c.is_numeric())
    }
}

fn is_word(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(char::is_alphanumeric)
}

fn is_field_name(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Corrected query, or `None` when every word is known
pub fn suggest(query: &str, searcher: &Searcher) -> Option<String> {
    SpellingCorrector::new(searcher).suggest(query)
}
