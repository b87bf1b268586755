pub mod api;
pub mod config;
pub mod error;
pub mod indexer;
pub mod metrics;
pub mod models;
pub mod query;
pub mod repository;
pub mod schema;
pub mod segment;
pub mod service;
pub mod tokenizer;

pub use config::{AnalyzerConfig, HighlightConfig, IndexSettings, ServerConfig, SpellingConfig};
pub use error::{Result, VanceError};
pub use models::*;
pub use segment::{SearchIndex, Searcher, WriterSession};
pub use service::SearchService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
