pub mod document;
pub mod search;

pub use document::{extract_name, ContentField, Document, StoredDocument, UNKNOWN_LANG};
pub use search::{BulkReport, SearchResponse, SearchResult};
