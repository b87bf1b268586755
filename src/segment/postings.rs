//! Per-field inverted index
//!
//! A `FieldIndex` owns the posting lists, the length statistics and, for
//! spelling-enabled fields, the unstemmed word counts of one field. Snapshots
//! hold each field behind an `Arc` and clone it only when a commit touches it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::statistics::FieldStatistics;
use super::types::{DocNo, Posting, PostingList};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FieldIndex {
    postings: BTreeMap<String, PostingList>,
    stats: FieldStatistics,
    /// Distinct terms per document, for removal
    doc_terms: BTreeMap<DocNo, Vec<String>>,
    /// Unstemmed word -> occurrences across the field
    vocabulary: BTreeMap<String, u64>,
    /// Unstemmed word counts per document, for removal
    doc_words: BTreeMap<DocNo, Vec<(String, u64)>>,
}

impl FieldIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a document's tokens (`(term, position)` pairs)
    ///
    /// `words` feeds the spelling vocabulary and is empty for fields that keep
    /// none. A docno that is already present is replaced.
    pub fn add_document<T, W>(&mut self, docno: DocNo, tokens: T, words: W)
    where
        T: IntoIterator<Item = (String, u32)>,
        W: IntoIterator<Item = String>,
    {
        self.remove_document(docno);

        let mut by_term: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        let mut doc_len = 0u32;
        for (term, position) in tokens {
            by_term.entry(term).or_default().push(position);
            doc_len += 1;
        }

        let mut word_counts: BTreeMap<String, u64> = BTreeMap::new();
        for word in words {
            *word_counts.entry(word).or_insert(0) += 1;
        }
        for (word, count) in &word_counts {
            *self.vocabulary.entry(word.clone()).or_insert(0) += count;
        }
        if !word_counts.is_empty() {
            self.doc_words.insert(docno, word_counts.into_iter().collect());
        }

        if by_term.is_empty() {
            return;
        }

        let mut terms = Vec::with_capacity(by_term.len());
        for (term, mut positions) in by_term {
            positions.sort_unstable();
            let list = self.postings.entry(term.clone()).or_default();
            let posting = Posting::with_positions(docno, positions);
            match list.binary_search_by_key(&docno, |p| p.docno) {
                Ok(idx) => list[idx] = posting,
                Err(idx) => list.insert(idx, posting),
            }
            terms.push(term);
        }

        self.doc_terms.insert(docno, terms);
        self.stats.add_document(docno, doc_len);
    }

    /// Remove every posting and vocabulary count of a document
    pub fn remove_document(&mut self, docno: DocNo) {
        if let Some(terms) = self.doc_terms.remove(&docno) {
            for term in terms {
                let now_empty = match self.postings.get_mut(&term) {
                    Some(list) => {
                        if let Ok(idx) = list.binary_search_by_key(&docno, |p| p.docno) {
                            list.remove(idx);
                        }
                        list.is_empty()
                    }
                    None => false,
                };
                if now_empty {
                    self.postings.remove(&term);
                }
            }
            self.stats.remove_document(docno);
        }

        if let Some(words) = self.doc_words.remove(&docno) {
            for (word, count) in words {
                let exhausted = match self.vocabulary.get_mut(&word) {
                    Some(total) => {
                        *total = total.saturating_sub(count);
                        *total == 0
                    }
                    None => false,
                };
                if exhausted {
                    self.vocabulary.remove(&word);
                }
            }
        }
    }

    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of documents containing the term
    pub fn doc_freq(&self, term: &str) -> u32 {
        self.postings(term).len() as u32
    }

    pub fn stats(&self) -> &FieldStatistics {
        &self.stats
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, u64> {
        &self.vocabulary
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    pub fn contains_document(&self, docno: DocNo) -> bool {
        self.doc_terms.contains_key(&docno)
    }
}
