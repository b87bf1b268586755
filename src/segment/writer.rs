//! Writer sessions
//!
//! A session holds the index's writer lock for its whole lifetime and stages
//! upserts and deletes in memory. Nothing is visible to searchers until
//! `commit` publishes a new generation; dropping the session discards
//! everything it staged.

use parking_lot::MutexGuard;
use tracing::debug;

use super::index::SearchIndex;
use crate::error::{Result, VanceError};
use crate::models::Document;

#[derive(Clone, Debug)]
pub(crate) enum StagedOp {
    Upsert(Document),
    Delete(String),
}

pub struct WriterSession<'a> {
    index: &'a SearchIndex,
    _guard: MutexGuard<'a, ()>,
    staged: Vec<StagedOp>,
}

impl<'a> WriterSession<'a> {
    pub(crate) fn new(index: &'a SearchIndex, guard: MutexGuard<'a, ()>) -> Self {
        Self {
            index,
            _guard: guard,
            staged: Vec::new(),
        }
    }

    /// Stage a delete-then-insert of the document's title
    ///
    /// Staging the same title twice keeps the last value.
    pub fn upsert(&mut self, document: Document) -> Result<()> {
        if document.title.trim().is_empty() {
            return Err(VanceError::InvalidRequest(
                "document title must not be empty".to_string(),
            ));
        }
        self.staged.push(StagedOp::Upsert(document));
        Ok(())
    }

    /// Stage removal of a document by title
    pub fn delete(&mut self, title: impl Into<String>) {
        self.staged.push(StagedOp::Delete(title.into()));
    }

    /// Number of staged operations
    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    /// Persist and publish staged changes; returns the number of documents upserted
    pub fn commit(mut self) -> Result<usize> {
        let staged = std::mem::take(&mut self.staged);
        self.index.commit_staged(&staged)
    }

    /// Discard staged changes and release the writer lock
    pub fn abort(self) {}
}

impl Drop for WriterSession<'_> {
    fn drop(&mut self) {
        if !self.staged.is_empty() {
            debug!(discarded = self.staged.len(), "writer session closed without commit");
        }
    }
}
