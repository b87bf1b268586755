use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, VanceError};
use crate::segment::Bm25Params;

/// Index settings configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub analyzer: AnalyzerConfig,
    pub ngram: NgramConfig,
    pub bm25: Bm25Params,
    /// Fraction of the non-best field scores added to the best field score
    pub tie_breaker: f32,
    /// Maximum number of results returned by a search
    pub result_limit: usize,
    pub highlight: HighlightConfig,
    pub spelling: SpellingConfig,
    /// How long write requests wait for the writer lock
    pub writer_timeout_ms: u64,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerConfig::default(),
            ngram: NgramConfig::default(),
            bm25: Bm25Params::default(),
            tie_breaker: 0.1,
            result_limit: 10,
            highlight: HighlightConfig::default(),
            spelling: SpellingConfig::default(),
            writer_timeout_ms: 5_000,
        }
    }
}

impl IndexSettings {
    /// Load settings from a JSON file; missing keys keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        serde_json::from_slice(&data).map_err(|e| {
            VanceError::InvalidRequest(format!(
                "invalid settings file {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    pub fn with_result_limit(mut self, limit: usize) -> Self {
        self.result_limit = limit;
        self
    }

    pub fn with_tie_breaker(mut self, tie_breaker: f32) -> Self {
        self.tie_breaker = tie_breaker;
        self
    }

    pub fn with_highlight(mut self, highlight: HighlightConfig) -> Self {
        self.highlight = highlight;
        self
    }
}

/// Analyzer configuration shared by every language-aware field
///
/// Stopword removal is off by default: the stopwords-iso lists include
/// ordinary content words ("hello", "information") a wiki search must find.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub lowercase: bool,
    pub remove_stopwords: bool,
    pub stem: bool,
    pub min_token_length: usize,
    pub max_token_length: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            remove_stopwords: false,
            stem: true,
            min_token_length: 1,
            max_token_length: 50,
        }
    }
}

/// Character n-gram sizes used by the `name` field
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NgramConfig {
    pub min_gram: usize,
    pub max_gram: usize,
}

impl Default for NgramConfig {
    fn default() -> Self {
        Self {
            min_gram: 2,
            max_gram: 4,
        }
    }
}

/// Highlight fragment configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Maximum length of the matched window, in bytes
    pub max_chars: usize,
    /// Context kept around the matched window, in bytes
    pub surround: usize,
    pub pre_tag: String,
    pub post_tag: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            max_chars: 200,
            surround: 40,
            pre_tag: "<b>".to_string(),
            post_tag: "</b>".to_string(),
        }
    }
}

/// Spelling suggestion configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellingConfig {
    pub max_distance: u32,
    /// Words shorter than this are never corrected
    pub min_word_length: usize,
}

impl Default for SpellingConfig {
    fn default() -> Self {
        Self {
            max_distance: 2,
            min_word_length: 3,
        }
    }
}

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub index_dir: PathBuf,
    pub repo_dir: PathBuf,
    pub branch: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            index_dir: PathBuf::from("./index"),
            repo_dir: PathBuf::from("."),
            branch: "master".to_string(),
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(index_dir: PathBuf, repo_dir: PathBuf) -> Self {
        Self {
            index_dir,
            repo_dir,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn with_bind_addr(mut self, bind_addr: impl Into<String>) -> Self {
        self.bind_addr = bind_addr.into();
        self
    }

    /// Set the git branch listed by the repository adapter
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_configs() {
        let settings = IndexSettings::default();
        assert_eq!(settings.result_limit, 10);
        assert!((settings.tie_breaker - 0.1).abs() < f32::EPSILON);
        assert_eq!(settings.ngram.min_gram, 2);
        assert_eq!(settings.ngram.max_gram, 4);

        let analyzer = AnalyzerConfig::default();
        assert!(analyzer.lowercase);
        assert!(analyzer.stem);

        let server = ServerConfig::default();
        assert_eq!(server.bind_addr, "127.0.0.1:5000");
        assert_eq!(server.branch, "master");
    }

    #[test]
    fn test_settings_builder() {
        let settings = IndexSettings::default()
            .with_result_limit(25)
            .with_tie_breaker(0.3);
        assert_eq!(settings.result_limit, 25);
        assert!((settings.tie_breaker - 0.3).abs() < f32::EPSILON);

        let server = ServerConfig::new(PathBuf::from("/tmp/ix"), PathBuf::from("/tmp/wiki"))
            .with_bind_addr("0.0.0.0:8080")
            .with_branch("main");
        assert_eq!(server.bind_addr, "0.0.0.0:8080");
        assert_eq!(server.branch, "main");
        assert_eq!(server.index_dir, PathBuf::from("/tmp/ix"));
    }

    #[test]
    fn test_settings_from_partial_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"result_limit": 3, "highlight": {{"pre_tag": "[", "post_tag": "]"}}}}"#)
            .unwrap();

        let settings = IndexSettings::from_json_file(file.path()).unwrap();
        assert_eq!(settings.result_limit, 3);
        assert_eq!(settings.highlight.pre_tag, "[");
        assert_eq!(settings.highlight.max_chars, 200);
        assert_eq!(settings.writer_timeout_ms, 5_000);
    }

    #[test]
    fn test_settings_from_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(IndexSettings::from_json_file(file.path()).is_err());
    }
}
