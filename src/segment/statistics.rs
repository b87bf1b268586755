//! Per-field statistics for BM25+ scoring

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::DocNo;

/// BM25+ parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    /// Term frequency saturation parameter
    pub k1: f32,
    /// Length normalization parameter
    pub b: f32,
    /// BM25+ delta parameter (avoids zero scores for high-frequency terms)
    pub delta: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: 1.2,
            b: 0.75,
            delta: 1.0,
        }
    }
}

/// Document lengths of a single field
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FieldStatistics {
    /// Number of documents with a value in this field
    pub doc_count: u32,
    /// Sum of all document lengths (for computing avgdl)
    pub total_doc_length: u64,
    doc_lengths: BTreeMap<DocNo, u32>,
}

impl FieldStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_document(&mut self, docno: DocNo, doc_len: u32) {
        if let Some(old) = self.doc_lengths.insert(docno, doc_len) {
            self.total_doc_length -= old as u64;
        } else {
            self.doc_count += 1;
        }
        self.total_doc_length += doc_len as u64;
    }

    pub fn remove_document(&mut self, docno: DocNo) {
        if let Some(old) = self.doc_lengths.remove(&docno) {
            self.total_doc_length -= old as u64;
            self.doc_count -= 1;
        }
    }

    pub fn doc_length(&self, docno: DocNo) -> Option<u32> {
        self.doc_lengths.get(&docno).copied()
    }

    pub fn avgdl(&self) -> f32 {
        if self.doc_count == 0 {
            0.0
        } else {
            (self.total_doc_length as f64 / self.doc_count as f64) as f32
        }
    }

    /// Compute BM25+ score for a term occurrence
    pub fn bm25_score(&self, tf: f32, df: u32, doc_len: u32, params: &Bm25Params) -> f32 {
        let avgdl = self.avgdl();
        if avgdl == 0.0 || self.doc_count == 0 {
            return 0.0;
        }

        let idf = self.idf(df);

        let doc_len = doc_len as f32;
        let norm = 1.0 - params.b + params.b * (doc_len / avgdl);

        let tf_component = (tf * (params.k1 + 1.0)) / (tf + params.k1 * norm);
        idf * (tf_component + params.delta)
    }

    /// Robertson-Sparck-Jones IDF
    pub fn idf(&self, df: u32) -> f32 {
        let n = self.doc_count as f32;
        let df = df as f32;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }
}
