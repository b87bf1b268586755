//! End-to-end properties of the index: upsert semantics, ranking, commit
//! atomicity, snapshot isolation and persistence.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tempfile::TempDir;
use vance::config::{HighlightConfig, IndexSettings};
use vance::error::VanceError;
use vance::models::Document;
use vance::query::{suggest, Highlighter, QueryExecutor, QueryParser};
use vance::schema::{FieldDef, FieldKind, Schema, CONTENT_EN, CONTENT_IT, NAME};
use vance::segment::{MemoryStorage, SearchIndex, Searcher, MANIFEST_FILE};

fn memory_index() -> (SearchIndex, MemoryStorage) {
    let storage = MemoryStorage::new();
    let index = SearchIndex::open_with_storage(
        Box::new(storage.clone()),
        Schema::wiki(),
        IndexSettings::default(),
    )
    .unwrap();
    (index, storage)
}

fn add(index: &SearchIndex, docs: &[(&str, Option<&str>, &str)]) {
    let mut writer = index.begin_writer().unwrap();
    for (title, lang, body) in docs {
        writer.upsert(Document::new(*title, *lang, *body)).unwrap();
    }
    writer.commit().unwrap();
}

fn search(searcher: &Searcher, q: &str) -> Vec<String> {
    let query = QueryParser::for_schema(searcher.schema(), searcher.settings().tie_breaker)
        .parse(q)
        .unwrap();
    QueryExecutor::execute(&query, searcher, 100)
        .into_iter()
        .map(|hit| hit.title)
        .collect()
}

fn find(searcher: &Searcher, name: &str) -> Vec<String> {
    let query = QueryParser::for_field(NAME).parse(name).unwrap();
    QueryExecutor::matching(&query, searcher)
        .into_iter()
        .filter_map(|docno| searcher.snapshot().document(docno))
        .map(|doc| doc.title.clone())
        .collect()
}

#[test]
fn test_upsert_is_idempotent() {
    let (index, _) = memory_index();
    add(&index, &[("docs/a.md", Some("en"), "hello world")]);
    add(&index, &[("docs/a.md", Some("en"), "hello world")]);

    let searcher = index.open_searcher();
    assert_eq!(searcher.doc_count(), 1);
    assert_eq!(search(&searcher, "hello"), vec!["docs/a.md"]);

    let field = searcher.snapshot().field(CONTENT_EN).unwrap();
    assert_eq!(field.postings("hello").len(), 1);
    assert_eq!(field.stats().doc_count, 1);
}

#[test]
fn test_round_trip_by_content() {
    let (index, _) = memory_index();
    add(&index, &[("notes/greeting.md", Some("en"), "hello world")]);

    let searcher = index.open_searcher();
    assert_eq!(search(&searcher, "hello"), vec!["notes/greeting.md"]);

    let stored = searcher.lookup_by_key("notes/greeting.md").unwrap();
    assert_eq!(stored.lang, "en");
    assert_eq!(stored.content(CONTENT_EN), Some("hello world"));
}

#[test]
fn test_name_match_outranks_content_only_match() {
    let (index, _) = memory_index();
    add(
        &index,
        &[
            ("wiki/overview.md", Some("en"), "an overview of the release process"),
            ("wiki/release.md", Some("en"), "an overview of the release process"),
        ],
    );

    let searcher = index.open_searcher();
    assert_eq!(
        search(&searcher, "release"),
        vec!["wiki/release.md", "wiki/overview.md"]
    );
}

#[test]
fn test_failed_commit_is_invisible() {
    let (index, storage) = memory_index();
    add(&index, &[("base.md", Some("en"), "baseline")]);
    let files_before = storage.file_names();

    // Snapshot write succeeds, manifest replacement fails
    storage.fail_after_writes(1);
    let mut writer = index.begin_writer().unwrap();
    writer.upsert(Document::new("one.md", Some("en"), "first staged")).unwrap();
    writer.upsert(Document::new("two.md", Some("en"), "second staged")).unwrap();
    assert!(matches!(writer.commit(), Err(VanceError::CommitFailed(_))));

    let searcher = index.open_searcher();
    assert_eq!(searcher.doc_count(), 1);
    assert!(search(&searcher, "staged").is_empty());
    assert!(searcher.lookup_by_key("one.md").is_err());
    assert_eq!(storage.file_names(), files_before);

    // Snapshot write itself fails
    storage.fail_next_write();
    let mut writer = index.begin_writer().unwrap();
    writer.upsert(Document::new("one.md", Some("en"), "first staged")).unwrap();
    assert!(writer.commit().is_err());
    assert_eq!(index.doc_count(), 1);

    // The index stays writable
    add(&index, &[("one.md", Some("en"), "first staged")]);
    assert_eq!(search(&index.open_searcher(), "staged"), vec!["one.md"]);
}

#[test]
fn test_searcher_is_isolated_from_later_commits() {
    let (index, _) = memory_index();
    add(&index, &[("old.md", Some("en"), "shared term")]);

    let before = index.open_searcher();
    add(&index, &[("new.md", Some("en"), "shared term")]);
    let after = index.open_searcher();

    assert_eq!(search(&before, "shared"), vec!["old.md"]);
    assert!(before.lookup_by_key("new.md").is_err());
    assert_eq!(search(&after, "shared"), vec!["old.md", "new.md"]);
    assert_eq!(before.generation() + 1, after.generation());
}

#[test]
fn test_concurrent_readers_during_commits() {
    let (index, _) = memory_index();
    let index = Arc::new(index);
    add(&index, &[("seed.md", Some("en"), "common")]);

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                for _ in 0..50 {
                    let searcher = index.open_searcher();
                    let hits = search(&searcher, "common");
                    assert_eq!(hits.len(), searcher.doc_count());
                }
            })
        })
        .collect();

    for i in 0..10 {
        let title = format!("doc{}.md", i);
        add(&index, &[(title.as_str(), Some("en"), "common")]);
    }
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(index.doc_count(), 11);
}

#[test]
fn test_spelling_suggestion() {
    let (index, _) = memory_index();
    let docs: Vec<(String, &str)> = (0..20)
        .map(|i| (format!("page{}.md", i), "hello there, hello again"))
        .collect();
    let mut writer = index.begin_writer().unwrap();
    for (title, body) in &docs {
        writer.upsert(Document::new(title.as_str(), Some("en"), *body)).unwrap();
    }
    writer.commit().unwrap();

    let searcher = index.open_searcher();
    let suggestion = suggest("helo", &searcher).unwrap();
    assert!(suggestion.contains("hello"));
    assert!(suggest("hello", &searcher).is_none());
}

#[test]
fn test_name_substring_lookup() {
    let (index, _) = memory_index();
    add(
        &index,
        &[
            ("docs/design-notes.md", Some("en"), "body"),
            ("docs/unrelated.md", Some("en"), "design everywhere"),
            ("archive/old-design.txt", None, "body"),
        ],
    );

    let searcher = index.open_searcher();
    assert_eq!(
        find(&searcher, "design"),
        vec!["docs/design-notes.md", "archive/old-design.txt"]
    );
    assert_eq!(find(&searcher, "notes"), vec!["docs/design-notes.md"]);
}

#[test]
fn test_unknown_language_is_searchable_in_both_fields() {
    let (index, _) = memory_index();
    add(&index, &[("misc/plain.txt", None, "gatti e cats")]);

    let searcher = index.open_searcher();
    let stored = searcher.lookup_by_key("misc/plain.txt").unwrap();
    assert_eq!(stored.lang, "[UNKNOWN]");
    assert_eq!(stored.content(CONTENT_IT), stored.content(CONTENT_EN));

    let query = QueryParser::for_schema(searcher.schema(), 0.1)
        .parse("cats")
        .unwrap();
    let hits = QueryExecutor::execute(&query, &searcher, 10);
    assert_eq!(hits.len(), 1);
    assert!(hits[0].matched_in(CONTENT_IT).is_some());
    assert!(hits[0].matched_in(CONTENT_EN).is_some());
}

#[test]
fn test_reopen_restores_documents() {
    let dir = TempDir::new().unwrap();
    {
        let index = SearchIndex::open(dir.path(), IndexSettings::default()).unwrap();
        add(
            &index,
            &[
                ("a.md", Some("en"), "persistent hello"),
                ("b.md", Some("it"), "ciao persistente"),
            ],
        );
        index.close();
    }

    let index = SearchIndex::open(dir.path(), IndexSettings::default()).unwrap();
    assert_eq!(index.doc_count(), 2);
    assert_eq!(index.generation(), 1);

    let searcher = index.open_searcher();
    assert_eq!(search(&searcher, "hello"), vec!["a.md"]);
    assert_eq!(search(&searcher, "ciao"), vec!["b.md"]);
    assert_eq!(suggest("helo", &searcher).as_deref(), Some("hello"));

    add(&index, &[("c.md", Some("en"), "after reopen")]);
    assert_eq!(index.generation(), 2);
    assert!(dir.path().join(MANIFEST_FILE).exists());
    assert!(!dir.path().join("snapshot_00000001.bin").exists());
    assert!(dir.path().join("snapshot_00000002.bin").exists());
}

#[test]
fn test_schema_mismatch_on_reopen() {
    let dir = TempDir::new().unwrap();
    SearchIndex::open(dir.path(), IndexSettings::default()).unwrap();

    let mut schema = Schema::wiki();
    schema.fields.push(FieldDef::new(
        "summary",
        FieldKind::Stored,
    ));
    let result = SearchIndex::open_with_schema(dir.path(), schema, IndexSettings::default());
    assert!(matches!(result, Err(VanceError::SchemaMismatch { .. })));
}

#[test]
fn test_corrupted_snapshot_is_rejected() {
    let dir = TempDir::new().unwrap();
    {
        let index = SearchIndex::open(dir.path(), IndexSettings::default()).unwrap();
        add(&index, &[("a.md", Some("en"), "data")]);
    }

    let snapshot = dir.path().join("snapshot_00000001.bin");
    let mut data = std::fs::read(&snapshot).unwrap();
    let last = data.len() - 1;
    data[last] ^= 0xff;
    std::fs::write(&snapshot, data).unwrap();

    let result = SearchIndex::open(dir.path(), IndexSettings::default());
    assert!(matches!(result, Err(VanceError::Corrupted(_))));
}

#[test]
fn test_writer_busy_and_timeout() {
    let (index, _) = memory_index();
    let writer = index.begin_writer().unwrap();

    assert!(matches!(index.begin_writer(), Err(VanceError::WriterBusy)));
    assert!(matches!(
        index.begin_writer_timeout(Duration::from_millis(20)),
        Err(VanceError::WriterBusy)
    ));

    drop(writer);
    assert!(index.begin_writer().is_ok());
}

#[test]
fn test_aborted_session_leaves_no_residue() {
    let (index, storage) = memory_index();
    add(&index, &[("keep.md", Some("en"), "kept")]);
    let files_before = storage.file_names();
    let generation = index.generation();

    let mut writer = index.begin_writer().unwrap();
    writer.upsert(Document::new("gone.md", Some("en"), "discarded")).unwrap();
    writer.delete("keep.md");
    writer.abort();

    assert_eq!(index.generation(), generation);
    assert_eq!(storage.file_names(), files_before);
    let searcher = index.open_searcher();
    assert!(searcher.lookup_by_key("keep.md").is_ok());
    assert!(search(&searcher, "discarded").is_empty());
}

#[test]
fn test_delete_commits() {
    let (index, _) = memory_index();
    add(
        &index,
        &[
            ("a.md", Some("en"), "alpha"),
            ("b.md", Some("en"), "alpha"),
        ],
    );

    let mut writer = index.begin_writer().unwrap();
    writer.delete("a.md");
    assert_eq!(writer.commit().unwrap(), 0);

    let searcher = index.open_searcher();
    assert_eq!(search(&searcher, "alpha"), vec!["b.md"]);
    assert!(matches!(
        searcher.lookup_by_key("a.md"),
        Err(VanceError::DocumentNotFound(_))
    ));
}

fn highlights(searcher: &Searcher, q: &str) -> Vec<String> {
    let highlighter = Highlighter::new(HighlightConfig::default());
    let query = QueryParser::for_schema(searcher.schema(), 0.1)
        .parse(q)
        .unwrap();
    QueryExecutor::execute(&query, searcher, 10)
        .iter()
        .map(|hit| {
            let doc = searcher.snapshot().document(hit.docno).unwrap();
            highlighter.highlight_hit(doc, hit, searcher)
        })
        .collect()
}

#[test]
fn test_fan_out_highlights_are_deduplicated() {
    let (index, _) = memory_index();
    add(&index, &[("misc/run.txt", None, "running runs quickly")]);
    let searcher = index.open_searcher();

    // Both fields mark the same word: emitted once
    assert_eq!(
        highlights(&searcher, "quickly"),
        vec!["running runs <b>quickly</b>"]
    );

    // Stemmers disagree on "running": one fragment per field
    assert_eq!(
        highlights(&searcher, "runs"),
        vec!["running <b>runs</b> quickly\n<b>running</b> <b>runs</b> quickly"]
    );
}

#[test]
fn test_single_language_highlight_has_one_fragment() {
    let (index, _) = memory_index();
    add(&index, &[("en/plain.md", Some("en"), "plain words only")]);
    let searcher = index.open_searcher();

    assert_eq!(highlights(&searcher, "plain"), vec!["<b>plain</b> words only"]);
}
