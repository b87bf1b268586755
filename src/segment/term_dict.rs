//! Spelling vocabulary backed by an FST
//!
//! Maps unstemmed words to their occurrence counts. Built from a field's
//! vocabulary whenever a commit changes it, never mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::io;

use fst::automaton::Levenshtein;
use fst::{IntoStreamer, Map, MapBuilder, Streamer};
use tracing::debug;

/// Immutable word -> frequency dictionary
pub struct SpellingDictionary {
    fst: Map<Vec<u8>>,
}

impl fmt::Debug for SpellingDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpellingDictionary")
            .field("words", &self.fst.len())
            .finish()
    }
}

impl SpellingDictionary {
    /// Build a dictionary from sorted word counts
    pub fn from_counts(counts: &BTreeMap<String, u64>) -> io::Result<Self> {
        let mut builder = MapBuilder::memory();
        for (word, count) in counts {
            builder
                .insert(word.as_bytes(), *count)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        }
        let data = builder.into_inner().map_err(io::Error::other)?;
        let fst = Map::new(data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Self { fst })
    }

    /// Occurrence count of a word
    pub fn frequency(&self, word: &str) -> Option<u64> {
        self.fst.get(word.as_bytes())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.fst.contains_key(word.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.fst.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fst.is_empty()
    }

    /// Words within `max_distance` edits of `word`, with distance and frequency
    ///
    /// Uses a Levenshtein automaton over the FST; falls back to a linear scan
    /// when the automaton cannot be built for the input.
    pub fn candidates(&self, word: &str, max_distance: u32) -> Vec<(String, usize, u64)> {
        let mut results = Vec::new();

        match Levenshtein::new(word, max_distance) {
            Ok(automaton) => {
                let mut stream = self.fst.search(automaton).into_stream();
                while let Some((key, freq)) = stream.next() {
                    if let Ok(candidate) = std::str::from_utf8(key) {
                        let distance = levenshtein_distance(word, candidate);
                        results.push((candidate.to_string(), distance, freq));
                    }
                }
            }
            Err(e) => {
                debug!(word, error = %e, "levenshtein automaton unavailable, scanning vocabulary");
                let mut stream = self.fst.stream();
                while let Some((key, freq)) = stream.next() {
                    if let Ok(candidate) = std::str::from_utf8(key) {
                        let distance = levenshtein_distance(word, candidate);
                        if distance <= max_distance as usize {
                            results.push((candidate.to_string(), distance, freq));
                        }
                    }
                }
            }
        }

        results
    }
}

/// Levenshtein edit distance over chars
///
/// Two-row dynamic programming, O(n*m) time and O(min(n, m)) space.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();

    if s1_chars.is_empty() {
        return s2_chars.len();
    }
    if s2_chars.is_empty() {
        return s1_chars.len();
    }

    let (shorter, longer) = if s1_chars.len() <= s2_chars.len() {
        (&s1_chars, &s2_chars)
    } else {
        (&s2_chars, &s1_chars)
    };

    let mut prev_row: Vec<usize> = (0..=shorter.len()).collect();
    let mut curr_row = vec![0; shorter.len() + 1];

    for i in 1..=longer.len() {
        curr_row[0] = i;
        for j in 1..=shorter.len() {
            let cost = usize::from(longer[i - 1] != shorter[j - 1]);
            curr_row[j] = (prev_row[j] + 1)
                .min(curr_row[j - 1] + 1)
                .min(prev_row[j - 1] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[shorter.len()]
}
