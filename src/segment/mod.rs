//! Snapshot-based inverted index
//!
//! # Architecture
//!
//! - `FieldIndex`: posting lists with positions and length statistics of one field
//! - `IndexSnapshot`: immutable generation of documents plus field indexes
//! - `SearchIndex`: publishes snapshots through `ArcSwap`, serializes writers
//! - `IndexStorage`: persistence backend (directory on disk, or memory for tests)
//! - `IndexManifest`: names the current snapshot file, replaced atomically

mod index;
mod manifest;
mod postings;
mod snapshot;
mod statistics;
mod storage;
mod term_dict;
mod types;
mod writer;

pub use index::{SearchIndex, Searcher};
pub use manifest::{snapshot_file_name, IndexManifest, MANIFEST_FILE, SCHEMA_FILE};
pub use postings::FieldIndex;
pub use snapshot::IndexSnapshot;
pub use statistics::{Bm25Params, FieldStatistics};
pub use storage::{DirectoryStorage, IndexStorage, MemoryStorage};
pub use term_dict::{levenshtein_distance, SpellingDictionary};
pub use types::{DocNo, Posting, PostingList};
pub use writer::WriterSession;
