use crate::config::NgramConfig;

/// Character n-gram analyzer for substring lookups on short values
#[derive(Clone, Debug)]
pub struct NgramAnalyzer {
    min_gram: usize,
    max_gram: usize,
}

impl NgramAnalyzer {
    pub fn new(config: &NgramConfig) -> Self {
        let min_gram = config.min_gram.max(1);
        Self {
            min_gram,
            max_gram: config.max_gram.max(min_gram),
        }
    }

    pub fn min_gram(&self) -> usize {
        self.min_gram
    }

    /// Grams written to the index: every gram of every size in
    /// `min_gram..=max_gram`, in order of start offset then size.
    ///
    /// Each gram is paired with its start offset in characters.
    pub fn index_grams(&self, value: &str) -> Vec<(String, u32)> {
        let chars: Vec<char> = value.to_lowercase().chars().collect();
        let mut grams = Vec::new();

        for start in 0..chars.len() {
            for size in self.min_gram..=self.max_gram {
                if start + size > chars.len() {
                    break;
                }
                let gram: String = chars[start..start + size].iter().collect();
                grams.push((gram, start as u32));
            }
        }

        grams
    }

    /// Grams a query term must all match.
    ///
    /// A term of length `L` yields its grams of size `min(L, max_gram)`; a term
    /// shorter than `min_gram` yields nothing and matches nothing.
    pub fn query_grams(&self, term: &str) -> Vec<String> {
        let chars: Vec<char> = term.to_lowercase().chars().collect();
        if chars.len() < self.min_gram {
            return Vec::new();
        }

        let size = chars.len().min(self.max_gram);
        let mut grams: Vec<String> = chars.windows(size).map(|w| w.iter().collect()).collect();
        grams.sort();
        grams.dedup();
        grams
    }
}
