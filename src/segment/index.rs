//! The search index handle
//!
//! `SearchIndex` owns the storage backend, the schema and the published
//! snapshot. Readers take an `Arc` of the current snapshot and never block;
//! a single writer session at a time builds and publishes the next one.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::manifest::{snapshot_file_name, IndexManifest, MANIFEST_FILE, SCHEMA_FILE};
use super::snapshot::IndexSnapshot;
use super::storage::{DirectoryStorage, IndexStorage};
use super::writer::{StagedOp, WriterSession};
use crate::config::IndexSettings;
use crate::error::{Result, VanceError};
use crate::models::StoredDocument;
use crate::schema::Schema;
use crate::tokenizer::SchemaAnalyzers;

pub struct SearchIndex {
    storage: Box<dyn IndexStorage>,
    schema: Arc<Schema>,
    analyzers: Arc<SchemaAnalyzers>,
    settings: Arc<IndexSettings>,
    current: ArcSwap<IndexSnapshot>,
    writer_lock: Mutex<()>,
    closed: AtomicBool,
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex").finish_non_exhaustive()
    }
}

impl SearchIndex {
    /// Open or create the wiki index in a directory
    pub fn open<P: AsRef<Path>>(path: P, settings: IndexSettings) -> Result<Self> {
        let schema = Schema::wiki_with_ngrams(&settings.ngram);
        Self::open_with_schema(path, schema, settings)
    }

    /// Open or create an index in a directory, expecting the given schema
    pub fn open_with_schema<P: AsRef<Path>>(
        path: P,
        schema: Schema,
        settings: IndexSettings,
    ) -> Result<Self> {
        let storage = DirectoryStorage::new(path.as_ref())?;
        info!(path = %path.as_ref().display(), "opening index");
        Self::open_with_storage(Box::new(storage), schema, settings)
    }

    /// Open or create an index on an arbitrary storage backend
    pub fn open_with_storage(
        storage: Box<dyn IndexStorage>,
        schema: Schema,
        settings: IndexSettings,
    ) -> Result<Self> {
        match storage.read(SCHEMA_FILE)? {
            Some(data) => {
                let persisted = Schema::from_json(&data)?;
                schema.ensure_compatible(&persisted)?;
            }
            None => {
                storage.write_atomic(SCHEMA_FILE, &schema.to_json()?)?;
                info!("created new index");
            }
        }

        let analyzers = SchemaAnalyzers::new(&schema, &settings.analyzer);
        let snapshot = Self::load_snapshot(storage.as_ref(), &analyzers)?;
        info!(
            generation = snapshot.generation(),
            documents = snapshot.doc_count(),
            "index loaded"
        );

        Ok(Self {
            storage,
            schema: Arc::new(schema),
            analyzers: Arc::new(analyzers),
            settings: Arc::new(settings),
            current: ArcSwap::from_pointee(snapshot),
            writer_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
        })
    }

    fn load_snapshot(
        storage: &dyn IndexStorage,
        analyzers: &SchemaAnalyzers,
    ) -> Result<IndexSnapshot> {
        let Some(manifest_data) = storage.read(MANIFEST_FILE)? else {
            return Ok(IndexSnapshot::new());
        };
        let manifest = IndexManifest::from_json(&manifest_data)
            .map_err(|e| VanceError::Corrupted(format!("unreadable manifest: {}", e)))?;

        let data = storage.read(&manifest.snapshot_file)?.ok_or_else(|| {
            VanceError::Corrupted(format!("missing snapshot file {}", manifest.snapshot_file))
        })?;
        if !manifest.verify(&data) {
            return Err(VanceError::Corrupted(format!(
                "checksum mismatch in {}",
                manifest.snapshot_file
            )));
        }

        let snapshot = IndexSnapshot::from_bytes(&data, analyzers.spelling_fields())?;
        if snapshot.generation() != manifest.generation {
            return Err(VanceError::Corrupted(format!(
                "snapshot generation {} does not match manifest generation {}",
                snapshot.generation(),
                manifest.generation
            )));
        }
        Ok(snapshot)
    }

    /// Begin a writer session, failing fast with `WriterBusy`
    pub fn begin_writer(&self) -> Result<WriterSession<'_>> {
        self.ensure_open()?;
        let guard = self.writer_lock.try_lock().ok_or(VanceError::WriterBusy)?;
        Ok(WriterSession::new(self, guard))
    }

    /// Begin a writer session, waiting up to `timeout` for the current one
    pub fn begin_writer_timeout(&self, timeout: Duration) -> Result<WriterSession<'_>> {
        self.ensure_open()?;
        let guard = self
            .writer_lock
            .try_lock_for(timeout)
            .ok_or(VanceError::WriterBusy)?;
        Ok(WriterSession::new(self, guard))
    }

    /// Point-in-time read view of the last committed generation
    pub fn open_searcher(&self) -> Searcher {
        Searcher {
            snapshot: self.current.load_full(),
            schema: Arc::clone(&self.schema),
            analyzers: Arc::clone(&self.analyzers),
            settings: Arc::clone(&self.settings),
        }
    }

    pub fn doc_count(&self) -> usize {
        self.current.load().doc_count()
    }

    pub fn generation(&self) -> u64 {
        self.current.load().generation()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    /// Refuse further writers; published snapshots stay readable
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            // Wait for an in-flight session to finish
            drop(self.writer_lock.lock());
            info!(
                generation = self.generation(),
                documents = self.doc_count(),
                "index closed"
            );
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(VanceError::Internal("index is closed".to_string()));
        }
        Ok(())
    }

    /// Build, persist and publish the next generation
    ///
    /// Called with the writer lock held. On error the current generation is
    /// left untouched.
    pub(crate) fn commit_staged(&self, staged: &[StagedOp]) -> Result<usize> {
        let current = self.current.load_full();
        let mut next = (*current).clone();
        let mut upserted = BTreeSet::new();

        for op in staged {
            match op {
                StagedOp::Upsert(doc) => {
                    next.upsert(doc, &self.schema, &self.analyzers);
                    upserted.insert(doc.title.as_str());
                }
                StagedOp::Delete(title) => {
                    if next.delete(title) {
                        upserted.remove(title.as_str());
                    }
                }
            }
        }

        let generation = current.generation() + 1;
        next.set_generation(generation);
        next.refresh_dictionaries(&current, self.analyzers.spelling_fields())
            .map_err(VanceError::CommitFailed)?;

        let data = next.to_bytes()?;
        let manifest = IndexManifest::new(generation, &data, next.doc_count() as u64);

        self.storage
            .write(&manifest.snapshot_file, &data)
            .map_err(VanceError::CommitFailed)?;

        let manifest_data = manifest.to_json().map_err(VanceError::CommitFailed)?;
        if let Err(e) = self.storage.write_atomic(MANIFEST_FILE, &manifest_data) {
            if self.manifest_names_other(&manifest.snapshot_file) {
                if let Err(cleanup) = self.storage.remove(&manifest.snapshot_file) {
                    warn!(error = %cleanup, file = %manifest.snapshot_file, "failed to remove orphaned snapshot");
                }
            } else {
                warn!(file = %manifest.snapshot_file, "manifest may already name the new snapshot, keeping it");
            }
            return Err(VanceError::CommitFailed(e));
        }

        let documents = next.doc_count();
        self.current.store(Arc::new(next));

        if current.generation() > 0 {
            let old = snapshot_file_name(current.generation());
            if let Err(e) = self.storage.remove(&old) {
                warn!(error = %e, file = %old, "failed to remove previous snapshot");
            }
        }

        info!(generation, upserted = upserted.len(), documents, "commit published");
        debug!(operations = staged.len(), "applied staged operations");
        Ok(upserted.len())
    }

    /// True only when the stored manifest is known to name some other file
    ///
    /// A manifest write can fail after the replacement landed; the snapshot
    /// it names must then survive.
    fn manifest_names_other(&self, snapshot_file: &str) -> bool {
        match self.storage.read(MANIFEST_FILE) {
            Ok(Some(data)) => IndexManifest::from_json(&data)
                .map(|stored| stored.snapshot_file != snapshot_file)
                .unwrap_or(false),
            Ok(None) => true,
            Err(_) => false,
        }
    }
}

/// Immutable point-in-time view of the index
///
/// Cloning a searcher shares the snapshot. The snapshot is released when the
/// last searcher holding it is dropped or closed.
#[derive(Clone)]
pub struct Searcher {
    snapshot: Arc<IndexSnapshot>,
    schema: Arc<Schema>,
    analyzers: Arc<SchemaAnalyzers>,
    settings: Arc<IndexSettings>,
}

impl Searcher {
    /// Fetch a stored document by title
    pub fn lookup_by_key(&self, title: &str) -> Result<StoredDocument> {
        self.snapshot
            .get(title)
            .map(|(_, doc)| doc.clone())
            .ok_or_else(|| VanceError::DocumentNotFound(title.to_string()))
    }

    pub fn snapshot(&self) -> &IndexSnapshot {
        &self.snapshot
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn analyzers(&self) -> &SchemaAnalyzers {
        &self.analyzers
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    pub fn generation(&self) -> u64 {
        self.snapshot.generation()
    }

    pub fn doc_count(&self) -> usize {
        self.snapshot.doc_count()
    }

    /// Release the snapshot
    pub fn close(self) {}
}
