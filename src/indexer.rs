//! Bulk indexing of a whole repository
//!
//! Pages are read and parsed by a small pool of reader threads, then staged in
//! repository order into a single writer session and committed once. Pages
//! that cannot be read or parsed are reported and skipped. Indexed documents
//! whose page is no longer listed are deleted in the same commit. A commit
//! failure fails the whole batch and leaves the index unchanged.

use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use crossbeam::channel;
use tracing::{info, warn};

use crate::error::{Result, VanceError};
use crate::models::{BulkReport, Document};
use crate::repository::DocumentRepository;
use crate::segment::SearchIndex;

const MAX_READERS: usize = 4;

pub struct BulkIndexer<'a> {
    index: &'a SearchIndex,
    repository: &'a dyn DocumentRepository,
    readers: usize,
}

impl<'a> BulkIndexer<'a> {
    pub fn new(index: &'a SearchIndex, repository: &'a dyn DocumentRepository) -> Self {
        let readers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(MAX_READERS);
        Self {
            index,
            repository,
            readers,
        }
    }

    pub fn with_readers(mut self, readers: usize) -> Self {
        self.readers = readers.max(1);
        self
    }

    /// Index every page of the repository in one commit, dropping vanished pages
    pub fn run(&self) -> Result<BulkReport> {
        let paths = self.repository.list_pages()?;
        info!(pages = paths.len(), readers = self.readers, "bulk indexing repository");

        let documents = self.read_all(&paths)?;

        let timeout = Duration::from_millis(self.index.settings().writer_timeout_ms);
        let mut writer = self.index.begin_writer_timeout(timeout)?;
        let mut report = BulkReport::default();

        for (path, document) in paths.iter().zip(documents) {
            match document.and_then(|doc| writer.upsert(doc)) {
                Ok(()) => {}
                Err(e) => {
                    warn!(path = %path, error = %e, "skipping page");
                    report.failed.push((path.clone(), e.to_string()));
                }
            }
        }

        let listed: HashSet<&str> = paths.iter().map(String::as_str).collect();
        let searcher = self.index.open_searcher();
        for (_, doc) in searcher.snapshot().documents() {
            if !listed.contains(doc.title.as_str()) {
                info!(title = %doc.title, "page removed from repository");
                writer.delete(doc.title.clone());
                report.removed += 1;
            }
        }

        if writer.staged_count() == 0 {
            writer.abort();
            return Ok(report);
        }

        report.indexed = writer.commit()?;
        info!(
            indexed = report.indexed,
            removed = report.removed,
            failed = report.failed.len(),
            "bulk indexing finished"
        );
        Ok(report)
    }

    /// Read and parse pages on the reader pool, preserving input order
    fn read_all(&self, paths: &[String]) -> Result<Vec<Result<Document>>> {
        let (path_tx, path_rx) = channel::unbounded::<(usize, &str)>();
        let (doc_tx, doc_rx) = channel::unbounded::<(usize, Result<Document>)>();

        for (i, path) in paths.iter().enumerate() {
            if path_tx.send((i, path.as_str())).is_err() {
                break;
            }
        }
        drop(path_tx);

        let repository = self.repository;
        crossbeam::scope(|s| {
            for _ in 0..self.readers {
                let rx = path_rx.clone();
                let tx = doc_tx.clone();
                s.spawn(move |_| {
                    for (i, path) in rx.iter() {
                        if tx.send((i, repository.read_document(path, None))).is_err() {
                            break;
                        }
                    }
                });
            }
        })
        .map_err(|_| VanceError::Internal("page reader thread panicked".to_string()))?;
        drop(doc_tx);

        let mut slots: Vec<Option<Result<Document>>> = paths.iter().map(|_| None).collect();
        for (i, result) in doc_rx.try_iter() {
            slots[i] = Some(result);
        }

        Ok(slots
            .into_iter()
            .zip(paths)
            .map(|(slot, path)| {
                slot.unwrap_or_else(|| {
                    Err(VanceError::Internal(format!("page {} was not read", path)))
                })
            })
            .collect())
    }
}
