//! The search service handle
//!
//! `SearchService` ties the index to the document repository and the metrics
//! registry. It is opened once at startup, shared by every request handler and
//! closed at shutdown.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::config::{IndexSettings, ServerConfig};
use crate::error::{Result, VanceError};
use crate::indexer::BulkIndexer;
use crate::metrics::SearchMetrics;
use crate::models::{BulkReport, Document, SearchResponse, SearchResult, StoredDocument};
use crate::query::{suggest, Highlighter, QueryExecutor, QueryParser};
use crate::repository::{DirectoryRepository, DocumentRepository, GitRepository};
use crate::schema::NAME;
use crate::segment::SearchIndex;

pub struct SearchService {
    index: SearchIndex,
    repository: Arc<dyn DocumentRepository>,
    metrics: Arc<SearchMetrics>,
    highlighter: Highlighter,
}

impl SearchService {
    pub fn new(
        index: SearchIndex,
        repository: Arc<dyn DocumentRepository>,
        metrics: Arc<SearchMetrics>,
    ) -> Self {
        let highlighter = Highlighter::new(index.settings().highlight.clone());
        metrics.set_index_state(index.doc_count(), index.generation());
        Self {
            index,
            repository,
            metrics,
            highlighter,
        }
    }

    /// Open the index and the repository named by a server configuration
    ///
    /// A repository directory without `.git` is read as a plain directory.
    pub fn open(config: &ServerConfig, settings: IndexSettings) -> Result<Self> {
        let index = SearchIndex::open(&config.index_dir, settings)?;
        let repository = open_repository(&config.repo_dir, &config.branch);
        let metrics = SearchMetrics::new()
            .map_err(|e| VanceError::Internal(format!("failed to register metrics: {}", e)))?;
        Ok(Self::new(index, repository, Arc::new(metrics)))
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn repository(&self) -> &dyn DocumentRepository {
        self.repository.as_ref()
    }

    pub fn metrics(&self) -> &SearchMetrics {
        &self.metrics
    }

    pub fn settings(&self) -> &IndexSettings {
        self.index.settings()
    }

    /// Ranked, highlighted results for a query string, plus a suggestion
    ///
    /// A blank query is `EmptyQuery`; a query with nothing searchable in it
    /// simply matches nothing.
    pub fn search(&self, query_string: &str) -> Result<SearchResponse> {
        if query_string.trim().is_empty() {
            return Err(VanceError::EmptyQuery);
        }

        let start = Instant::now();
        let searcher = self.index.open_searcher();
        let parser = QueryParser::for_schema(searcher.schema(), self.settings().tie_breaker);

        let query = match parser.parse(query_string) {
            Ok(query) => query,
            Err(VanceError::EmptyQuery) => return Ok(SearchResponse::default()),
            Err(e) => {
                self.metrics.record_search_error();
                return Err(e);
            }
        };

        let hits = QueryExecutor::execute(&query, &searcher, self.settings().result_limit);
        let results = hits
            .iter()
            .filter_map(|hit| {
                let doc = searcher.snapshot().document(hit.docno)?;
                Some(SearchResult {
                    title: doc.title.clone(),
                    lang: doc.lang.clone(),
                    highlight: self.highlighter.highlight_hit(doc, hit, &searcher),
                })
            })
            .collect();

        let suggestion = suggest(query_string, &searcher);
        if suggestion.is_some() {
            self.metrics.record_suggestion();
        }

        self.metrics
            .record_search("search", start.elapsed().as_secs_f64());
        Ok(SearchResponse {
            results,
            suggestion,
        })
    }

    /// Titles whose name contains the query, in insertion order
    ///
    /// A blank query returns no titles.
    pub fn find_by_name(&self, name_query: &str) -> Result<Vec<String>> {
        let start = Instant::now();
        let searcher = self.index.open_searcher();

        let query = match QueryParser::for_field(NAME).parse(name_query) {
            Ok(query) => query,
            Err(VanceError::EmptyQuery) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let titles = QueryExecutor::matching(&query, &searcher)
            .into_iter()
            .filter_map(|docno| searcher.snapshot().document(docno))
            .map(|doc| doc.title.clone())
            .collect();

        self.metrics.record_search("find", start.elapsed().as_secs_f64());
        Ok(titles)
    }

    /// Stored document by title
    pub fn get(&self, title: &str) -> Result<StoredDocument> {
        let start = Instant::now();
        let result = self.index.open_searcher().lookup_by_key(title);
        self.metrics.record_search("get", start.elapsed().as_secs_f64());
        result
    }

    /// Read a page from the repository and index it
    ///
    /// A leading `/` is stripped from the path; `lang` overrides the page's
    /// declared language.
    pub fn add(&self, path: &str, lang: Option<&str>) -> Result<usize> {
        let path = path.strip_prefix('/').unwrap_or(path);
        if path.trim().is_empty() {
            return Err(VanceError::InvalidRequest("missing page path".to_string()));
        }

        let document = self.repository.read_document(path, lang)?;
        self.add_documents(vec![document])
    }

    /// Upsert documents in a single commit
    pub fn add_documents(&self, documents: Vec<Document>) -> Result<usize> {
        let start = Instant::now();
        let timeout = Duration::from_millis(self.settings().writer_timeout_ms);

        let mut writer = self.index.begin_writer_timeout(timeout)?;
        for document in documents {
            writer.upsert(document)?;
        }
        let upserted = writer.commit()?;

        self.metrics
            .record_commit(upserted, start.elapsed().as_secs_f64());
        self.refresh_gauges();
        Ok(upserted)
    }

    /// Index every page of the repository
    pub fn index_repository(&self) -> Result<BulkReport> {
        let start = Instant::now();
        let report = BulkIndexer::new(&self.index, self.repository.as_ref()).run()?;

        self.metrics.record_failed_documents(report.failed.len());
        if report.indexed > 0 || report.removed > 0 {
            self.metrics
                .record_commit(report.indexed, start.elapsed().as_secs_f64());
        }
        self.refresh_gauges();
        Ok(report)
    }

    /// Index the repository on a background thread
    pub fn spawn_index_repository(self: &Arc<Self>) -> thread::JoinHandle<Result<BulkReport>> {
        let service = Arc::clone(self);
        thread::spawn(move || {
            let result = service.index_repository();
            match &result {
                Ok(report) => info!(
                    indexed = report.indexed,
                    removed = report.removed,
                    failed = report.failed.len(),
                    "background indexing finished"
                ),
                Err(e) => error!(error = %e, "background indexing failed"),
            }
            result
        })
    }

    /// Stop accepting writes
    pub fn close(&self) {
        self.index.close();
    }

    fn refresh_gauges(&self) {
        self.metrics
            .set_index_state(self.index.doc_count(), self.index.generation());
    }
}

fn open_repository(root: &Path, branch: &str) -> Arc<dyn DocumentRepository> {
    if root.join(".git").exists() {
        info!(repo = %root.display(), branch, "using git repository");
        Arc::new(GitRepository::new(root, branch))
    } else {
        warn!(repo = %root.display(), "no .git directory, reading repository as a plain directory");
        Arc::new(DirectoryRepository::new(root))
    }
}
