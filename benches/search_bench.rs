use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use vance::config::IndexSettings;
use vance::models::Document;
use vance::query::{suggest, QueryExecutor, QueryParser};
use vance::schema::Schema;
use vance::segment::{MemoryStorage, SearchIndex};

const WORDS: [&str; 12] = [
    "rust", "programming", "language", "release", "deploy", "service", "wiki", "page",
    "search", "index", "garden", "notes",
];

fn make_body(id: usize) -> String {
    (0..40)
        .map(|i| WORDS[(id * 7 + i * 3) % WORDS.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

fn build_index(doc_count: usize) -> SearchIndex {
    let index = SearchIndex::open_with_storage(
        Box::new(MemoryStorage::new()),
        Schema::wiki(),
        IndexSettings::default(),
    )
    .unwrap();

    let mut writer = index.begin_writer().unwrap();
    for i in 0..doc_count {
        let lang = if i % 5 == 0 { None } else { Some("en") };
        writer
            .upsert(Document::new(format!("pages/doc-{}.md", i), lang, make_body(i)))
            .unwrap();
    }
    writer.commit().unwrap();
    index
}

fn bench_ranked_search(c: &mut Criterion) {
    let counts = [1_000usize, 5_000];
    let indexes: Vec<(usize, SearchIndex)> =
        counts.iter().map(|&n| (n, build_index(n))).collect();

    let mut group = c.benchmark_group("ranked_search");
    for (count, index) in indexes.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), index, |b, index| {
            let searcher = index.open_searcher();
            let query = QueryParser::for_schema(searcher.schema(), 0.1)
                .parse("rust programming -garden")
                .unwrap();
            b.iter(|| {
                black_box(QueryExecutor::execute(&query, &searcher, 10));
            });
        });
    }
    group.finish();
}

fn bench_name_lookup(c: &mut Criterion) {
    let index = build_index(5_000);
    let searcher = index.open_searcher();
    let query = QueryParser::for_field(vance::schema::NAME)
        .parse("doc-42")
        .unwrap();

    c.bench_function("name_lookup", |b| {
        b.iter(|| black_box(QueryExecutor::matching(&query, &searcher)));
    });
}

fn bench_spelling(c: &mut Criterion) {
    let index = build_index(1_000);
    let searcher = index.open_searcher();

    c.bench_function("spelling_suggestion", |b| {
        b.iter(|| black_box(suggest("progamming langauge", &searcher)));
    });
}

fn bench_commit(c: &mut Criterion) {
    let index = build_index(1_000);
    let mut i = 0usize;

    c.bench_function("single_document_commit", |b| {
        b.iter(|| {
            i += 1;
            let mut writer = index.begin_writer().unwrap();
            writer
                .upsert(Document::new(format!("extra/{}.md", i % 100), Some("en"), make_body(i)))
                .unwrap();
            black_box(writer.commit().unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_ranked_search,
    bench_name_lookup,
    bench_spelling,
    bench_commit
);
criterion_main!(benches);
