use prometheus::{
    Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Prometheus metrics for the search service
#[derive(Clone)]
pub struct SearchMetrics {
    // Counters
    pub documents_indexed: Counter,
    pub documents_failed: Counter,
    pub commits_total: Counter,
    pub searches_total: CounterVec,
    pub search_errors: Counter,
    pub suggestions_total: Counter,

    // Gauges
    pub total_documents: Gauge,
    pub index_generation: Gauge,

    // Histograms
    pub commit_latency: Histogram,
    pub search_latency: HistogramVec,
    pub batch_size: Histogram,

    registry: Arc<Registry>,
}

impl SearchMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let documents_indexed = Counter::with_opts(Opts::new(
            "vance_documents_indexed_total",
            "Total number of documents indexed",
        ))?;
        registry.register(Box::new(documents_indexed.clone()))?;

        let documents_failed = Counter::with_opts(Opts::new(
            "vance_documents_failed_total",
            "Total number of documents that could not be read or parsed",
        ))?;
        registry.register(Box::new(documents_failed.clone()))?;

        let commits_total = Counter::with_opts(Opts::new(
            "vance_commits_total",
            "Total number of successful index commits",
        ))?;
        registry.register(Box::new(commits_total.clone()))?;

        let searches_total = CounterVec::new(
            Opts::new("vance_searches_total", "Total number of lookups by type"),
            &["type"],
        )?;
        registry.register(Box::new(searches_total.clone()))?;

        let search_errors = Counter::with_opts(Opts::new(
            "vance_search_errors_total",
            "Total number of failed lookups",
        ))?;
        registry.register(Box::new(search_errors.clone()))?;

        let suggestions_total = Counter::with_opts(Opts::new(
            "vance_suggestions_total",
            "Total number of searches answered with a spelling suggestion",
        ))?;
        registry.register(Box::new(suggestions_total.clone()))?;

        let total_documents = Gauge::with_opts(Opts::new(
            "vance_total_documents",
            "Current number of documents in the index",
        ))?;
        registry.register(Box::new(total_documents.clone()))?;

        let index_generation = Gauge::with_opts(Opts::new(
            "vance_index_generation",
            "Generation of the published index snapshot",
        ))?;
        registry.register(Box::new(index_generation.clone()))?;

        let commit_latency = Histogram::with_opts(
            HistogramOpts::new("vance_commit_latency_seconds", "Index commit latency")
                .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]),
        )?;
        registry.register(Box::new(commit_latency.clone()))?;

        let search_latency = HistogramVec::new(
            HistogramOpts::new("vance_search_latency_seconds", "Lookup latency")
                .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
            &["type"],
        )?;
        registry.register(Box::new(search_latency.clone()))?;

        let batch_size = Histogram::with_opts(
            HistogramOpts::new("vance_batch_size", "Number of documents per commit")
                .buckets(vec![1.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0]),
        )?;
        registry.register(Box::new(batch_size.clone()))?;

        Ok(Self {
            documents_indexed,
            documents_failed,
            commits_total,
            searches_total,
            search_errors,
            suggestions_total,
            total_documents,
            index_generation,
            commit_latency,
            search_latency,
            batch_size,
            registry: Arc::new(registry),
        })
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Record a successful commit of `documents` upserts
    pub fn record_commit(&self, documents: usize, duration_secs: f64) {
        self.commits_total.inc();
        self.documents_indexed.inc_by(documents as f64);
        self.batch_size.observe(documents as f64);
        self.commit_latency.observe(duration_secs);
    }

    pub fn record_failed_documents(&self, count: usize) {
        self.documents_failed.inc_by(count as f64);
    }

    /// Record a lookup (`search`, `find` or `get`)
    pub fn record_search(&self, search_type: &str, duration_secs: f64) {
        self.searches_total.with_label_values(&[search_type]).inc();
        self.search_latency
            .with_label_values(&[search_type])
            .observe(duration_secs);
    }

    pub fn record_search_error(&self) {
        self.search_errors.inc();
    }

    pub fn record_suggestion(&self) {
        self.suggestions_total.inc();
    }

    /// Update the index gauges
    pub fn set_index_state(&self, doc_count: usize, generation: u64) {
        self.total_documents.set(doc_count as f64);
        self.index_generation.set(generation as f64);
    }

    /// Render every metric in the Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
