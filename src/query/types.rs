//! Query representation shared by the parser and the executor

use std::collections::{BTreeMap, BTreeSet};

use crate::segment::DocNo;

/// How a clause participates in matching
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Occur {
    Must,
    Should,
    MustNot,
}

/// Clause payload, still unanalyzed
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClauseKind {
    /// A single query word; may analyze to several terms
    Term(String),
    /// Words that must appear at consecutive positions
    Phrase(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clause {
    pub kind: ClauseKind,
    pub occur: Occur,
    /// Field restriction; `None` applies the clause to every weighted field
    pub field: Option<String>,
}

impl Clause {
    pub fn applies_to(&self, field: &str) -> bool {
        self.field.as_deref().map_or(true, |f| f == field)
    }
}

/// Parsed query: clauses plus the field-weight table and tie-breaker
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub clauses: Vec<Clause>,
    pub field_weights: Vec<(String, f32)>,
    /// Fraction of the non-best field scores added to the best field score
    pub tie_breaker: f32,
}

/// A scored match
#[derive(Clone, Debug, PartialEq)]
pub struct Hit {
    pub docno: DocNo,
    pub title: String,
    pub score: f32,
    /// Analyzed terms that matched, per field
    pub matched_terms: BTreeMap<String, BTreeSet<String>>,
}

impl Hit {
    pub fn matched_in(&self, field: &str) -> Option<&BTreeSet<String>> {
        self.matched_terms.get(field)
    }
}
