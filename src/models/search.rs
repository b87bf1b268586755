use serde::{Deserialize, Serialize};

/// A ranked search result
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub lang: String,
    pub highlight: String,
}

/// Ranked results plus an optional corrected query
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub suggestion: Option<String>,
}

impl SearchResponse {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Outcome of indexing a batch of repository paths
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BulkReport {
    /// Documents committed
    pub indexed: usize,
    /// Indexed documents whose page no longer exists in the repository
    pub removed: usize,
    /// Paths that could not be read or parsed, with the reason
    pub failed: Vec<(String, String)>,
}

impl BulkReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
