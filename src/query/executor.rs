//! Query executor
//!
//! Evaluates a parsed [`Query`] against a searcher's snapshot. Each weighted
//! field is evaluated on its own: required clauses are intersected, optional
//! clauses are unioned when nothing is required. Field scores are summed BM25
//! contributions times the field boost, and the fields a document matched are
//! combined dis-max style: the best field score plus `tie_breaker` times the
//! others.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap};

use ordered_float::OrderedFloat;
use roaring::RoaringBitmap;
use tracing::debug;

use super::types::{Clause, ClauseKind, Hit, Occur, Query};
use crate::segment::{Bm25Params, DocNo, FieldIndex, Posting, Searcher};
use crate::tokenizer::{words, FieldAnalyzer};

/// Runs queries against a searcher
pub struct QueryExecutor;

/// Documents matching one clause in one field
#[derive(Debug, Default)]
struct ClauseMatch {
    docs: RoaringBitmap,
    scores: HashMap<u32, f32>,
    terms: Vec<String>,
}

/// Per-document state accumulated across fields
#[derive(Debug, Default)]
struct DocMatch {
    field_scores: Vec<f32>,
    matched_terms: BTreeMap<String, BTreeSet<String>>,
}

impl QueryExecutor {
    /// Execute a query and return at most `limit` hits
    ///
    /// Hits are ordered by descending score; equal scores keep docno order.
    pub fn execute(query: &Query, searcher: &Searcher, limit: usize) -> Vec<Hit> {
        let mut matches = Self::evaluate(query, searcher);
        let total = matches.len();
        let snapshot = searcher.snapshot();

        let ranked = top_k(
            matches
                .iter()
                .map(|(docno, m)| (*docno, combine(&m.field_scores, query.tie_breaker))),
            limit,
        );

        let hits: Vec<Hit> = ranked
            .into_iter()
            .filter_map(|entry| {
                let doc = snapshot.document(entry.docno)?;
                let m = matches.remove(&entry.docno)?;
                Some(Hit {
                    docno: entry.docno,
                    title: doc.title.clone(),
                    score: entry.score.0,
                    matched_terms: m.matched_terms,
                })
            })
            .collect();

        debug!(
            clauses = query.clauses.len(),
            total_hits = total,
            returned = hits.len(),
            "executed query"
        );
        hits
    }

    /// Every matching docno, in insertion order, without scoring
    pub fn matching(query: &Query, searcher: &Searcher) -> Vec<DocNo> {
        Self::evaluate(query, searcher).into_keys().collect()
    }

    fn evaluate(query: &Query, searcher: &Searcher) -> BTreeMap<DocNo, DocMatch> {
        let snapshot = searcher.snapshot();
        let analyzers = searcher.analyzers();
        let params = &searcher.settings().bm25;

        let mut excluded = RoaringBitmap::new();
        let mut filters: Vec<RoaringBitmap> = Vec::new();
        let mut results: BTreeMap<DocNo, DocMatch> = BTreeMap::new();

        for (field, boost) in &query.field_weights {
            let (Some(index), Some(analyzer)) = (snapshot.field(field), analyzers.get(field))
            else {
                continue;
            };

            let mut required: Vec<ClauseMatch> = Vec::new();
            let mut optional: Vec<ClauseMatch> = Vec::new();
            let mut unsatisfiable = false;

            for clause in query.clauses.iter().filter(|c| c.applies_to(field)) {
                let Some(m) = match_clause(clause, index, analyzer, params) else {
                    // A required term too short to produce grams matches nothing
                    if clause.occur == Occur::Must && matches!(analyzer, FieldAnalyzer::Ngram(_)) {
                        unsatisfiable = true;
                        if clause.field.is_some() {
                            filters.push(RoaringBitmap::new());
                        }
                    }
                    continue;
                };
                match clause.occur {
                    Occur::MustNot => excluded |= &m.docs,
                    Occur::Must => {
                        if clause.field.is_some() {
                            filters.push(m.docs.clone());
                        }
                        required.push(m);
                    }
                    Occur::Should => optional.push(m),
                }
            }

            if unsatisfiable {
                debug!(field = %field, "required clause yields no grams");
                continue;
            }

            let candidates = if !required.is_empty() {
                intersect(required.iter().map(|m| &m.docs))
            } else if !optional.is_empty() {
                optional.iter().fold(RoaringBitmap::new(), |acc, m| acc | &m.docs)
            } else {
                continue;
            };

            for raw in candidates.iter() {
                let mut score = 0.0_f32;
                let mut terms: BTreeSet<String> = BTreeSet::new();
                for m in required.iter().chain(optional.iter()) {
                    if let Some(s) = m.scores.get(&raw) {
                        score += *s;
                        terms.extend(m.terms.iter().cloned());
                    }
                }

                let entry = results.entry(DocNo::new(raw)).or_default();
                entry.field_scores.push(score * boost);
                entry.matched_terms.insert(field.clone(), terms);
            }
        }

        results.retain(|docno, _| {
            let raw = docno.as_u32();
            !excluded.contains(raw) && filters.iter().all(|f| f.contains(raw))
        });
        results
    }
}

/// Ranking key: higher score first, then lower docno
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Ranked {
    score: OrderedFloat<f32>,
    docno: DocNo,
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| other.docno.cmp(&self.docno))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The `k` best entries, best first
fn top_k(scores: impl Iterator<Item = (DocNo, f32)>, k: usize) -> Vec<Ranked> {
    if k == 0 {
        return Vec::new();
    }

    let mut heap: BinaryHeap<Reverse<Ranked>> = BinaryHeap::with_capacity(k + 1);
    for (docno, score) in scores {
        let entry = Ranked {
            score: OrderedFloat(score),
            docno,
        };
        if heap.len() < k {
            heap.push(Reverse(entry));
        } else if let Some(min) = heap.peek() {
            if entry > min.0 {
                heap.pop();
                heap.push(Reverse(entry));
            }
        }
    }

    let mut results: Vec<Ranked> = heap.into_iter().map(|Reverse(entry)| entry).collect();
    results.sort_by(|a, b| b.cmp(a));
    results
}

/// Best field score plus `tie_breaker` times the sum of the others
fn combine(field_scores: &[f32], tie_breaker: f32) -> f32 {
    let best = field_scores.iter().copied().fold(0.0_f32, f32::max);
    let sum: f32 = field_scores.iter().sum();
    best + tie_breaker * (sum - best)
}

fn intersect<'a>(mut sets: impl Iterator<Item = &'a RoaringBitmap>) -> RoaringBitmap {
    let Some(first) = sets.next() else {
        return RoaringBitmap::new();
    };
    sets.fold(first.clone(), |acc, set| acc & set)
}

/// Evaluate one clause in one field
///
/// Returns `None` when the clause analyzes to no terms in this field. Content
/// fields then ignore it; an n-gram field treats a required one as unmatched.
fn match_clause(
    clause: &Clause,
    index: &FieldIndex,
    analyzer: &FieldAnalyzer,
    params: &Bm25Params,
) -> Option<ClauseMatch> {
    match (&clause.kind, analyzer) {
        (ClauseKind::Term(word), _) => {
            let terms = dedup(analyzer.query_terms(word));
            conjunction(index, terms, params)
        }
        (ClauseKind::Phrase(text), FieldAnalyzer::Text(text_analyzer)) => {
            let tokens: Vec<(String, u32)> = text_analyzer
                .analyze(text)
                .map(|t| (t.term, t.position))
                .collect();
            if tokens.len() <= 1 {
                let terms = tokens.into_iter().map(|(term, _)| term).collect();
                return conjunction(index, terms, params);
            }
            phrase(index, &tokens, params)
        }
        // Grams carry no word positions; a phrase is the conjunction of its words
        (ClauseKind::Phrase(text), FieldAnalyzer::Ngram(_)) => {
            let terms = dedup(words(text).flat_map(|w| analyzer.query_terms(&w)).collect());
            conjunction(index, terms, params)
        }
    }
}

fn dedup(terms: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    terms.into_iter().filter(|t| seen.insert(t.clone())).collect()
}

/// Documents containing every term, scored by summed BM25
fn conjunction(index: &FieldIndex, terms: Vec<String>, params: &Bm25Params) -> Option<ClauseMatch> {
    if terms.is_empty() {
        return None;
    }

    let postings: Vec<&[Posting]> = terms.iter().map(|t| index.postings(t)).collect();
    let docs = intersect(postings.iter().map(|p| docs_of(p)).collect::<Vec<_>>().iter());

    let mut scores = HashMap::new();
    for list in &postings {
        let df = list.len() as u32;
        for posting in list.iter().filter(|p| docs.contains(p.docno.as_u32())) {
            *scores.entry(posting.docno.as_u32()).or_insert(0.0) +=
                score_posting(index, posting, df, params);
        }
    }

    Some(ClauseMatch {
        docs,
        scores,
        terms,
    })
}

/// Documents containing the tokens at their relative positions
fn phrase(index: &FieldIndex, tokens: &[(String, u32)], params: &Bm25Params) -> Option<ClauseMatch> {
    let base = tokens.first().map(|(_, p)| *p)?;
    let postings: Vec<&[Posting]> = tokens.iter().map(|(t, _)| index.postings(t)).collect();
    let candidates = intersect(postings.iter().map(|p| docs_of(p)).collect::<Vec<_>>().iter());

    let by_doc: Vec<HashMap<u32, &Posting>> = postings
        .iter()
        .map(|list| list.iter().map(|p| (p.docno.as_u32(), p)).collect())
        .collect();

    let mut docs = RoaringBitmap::new();
    let mut scores = HashMap::new();

    for raw in candidates.iter() {
        let per_token: Option<Vec<&Posting>> = by_doc.iter().map(|m| m.get(&raw).copied()).collect();
        let Some(per_token) = per_token else {
            continue;
        };

        let aligned = per_token[0].positions.iter().any(|start| {
            tokens.iter().zip(&per_token).skip(1).all(|((_, pos), posting)| {
                let offset = pos - base;
                posting.positions.binary_search(&(start + offset)).is_ok()
            })
        });
        if !aligned {
            continue;
        }

        docs.insert(raw);
        let mut seen = BTreeSet::new();
        let score: f32 = tokens
            .iter()
            .zip(&per_token)
            .zip(&postings)
            .filter(|(((term, _), _), _)| seen.insert(term.as_str()))
            .map(|((_, posting), list)| score_posting(index, posting, list.len() as u32, params))
            .sum();
        scores.insert(raw, score);
    }

    Some(ClauseMatch {
        docs,
        scores,
        terms: dedup(tokens.iter().map(|(t, _)| t.clone()).collect()),
    })
}

fn docs_of(postings: &[Posting]) -> RoaringBitmap {
    postings.iter().map(|p| p.docno.as_u32()).collect()
}

fn score_posting(index: &FieldIndex, posting: &Posting, df: u32, params: &Bm25Params) -> f32 {
    let doc_len = index.stats().doc_length(posting.docno).unwrap_or(0);
    index
        .stats()
        .bm25_score(posting.term_frequency as f32, df, doc_len, params)
}
