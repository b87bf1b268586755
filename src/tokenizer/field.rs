use std::collections::BTreeMap;

use super::analyzer::{words, Analyzer};
use super::ngram::NgramAnalyzer;
use crate::config::{AnalyzerConfig, NgramConfig};
use crate::schema::{FieldKind, Schema};

/// Analyzer attached to one indexed field
#[derive(Debug)]
pub enum FieldAnalyzer {
    Text(Analyzer),
    Ngram(NgramAnalyzer),
}

impl FieldAnalyzer {
    /// `(term, position)` pairs written to the field's postings
    pub fn index_tokens(&self, value: &str) -> Vec<(String, u32)> {
        match self {
            FieldAnalyzer::Text(analyzer) => analyzer
                .analyze(value)
                .map(|t| (t.term, t.position))
                .collect(),
            FieldAnalyzer::Ngram(ngram) => ngram.index_grams(value),
        }
    }

    /// Terms a single query word must all match in this field
    pub fn query_terms(&self, word: &str) -> Vec<String> {
        match self {
            FieldAnalyzer::Text(analyzer) => analyzer.terms(word),
            FieldAnalyzer::Ngram(ngram) => ngram.query_grams(word),
        }
    }

    pub fn as_text(&self) -> Option<&Analyzer> {
        match self {
            FieldAnalyzer::Text(analyzer) => Some(analyzer),
            FieldAnalyzer::Ngram(_) => None,
        }
    }
}

/// Analyzers for every indexed field of a schema
#[derive(Debug)]
pub struct SchemaAnalyzers {
    fields: BTreeMap<String, FieldAnalyzer>,
    spelling_fields: Vec<String>,
}

impl SchemaAnalyzers {
    pub fn new(schema: &Schema, config: &AnalyzerConfig) -> Self {
        let mut fields = BTreeMap::new();
        let mut spelling_fields = Vec::new();

        for field in schema.indexed_fields() {
            let analyzer = match &field.kind {
                FieldKind::Text { language, spelling } => {
                    if *spelling {
                        spelling_fields.push(field.name.clone());
                    }
                    FieldAnalyzer::Text(Analyzer::new(config, Some(*language)))
                }
                FieldKind::Ngram { min_gram, max_gram } => {
                    FieldAnalyzer::Ngram(NgramAnalyzer::new(&NgramConfig {
                        min_gram: *min_gram,
                        max_gram: *max_gram,
                    }))
                }
                FieldKind::Id | FieldKind::Stored => continue,
            };
            fields.insert(field.name.clone(), analyzer);
        }

        Self {
            fields,
            spelling_fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldAnalyzer> {
        self.fields.get(field)
    }

    /// Unstemmed words kept in a field's spelling vocabulary
    pub fn vocabulary_words(&self, field: &str, value: &str) -> Vec<String> {
        if self.has_spelling(field) {
            words(value).collect()
        } else {
            Vec::new()
        }
    }

    pub fn has_spelling(&self, field: &str) -> bool {
        self.spelling_fields.iter().any(|f| f == field)
    }

    pub fn spelling_fields(&self) -> &[String] {
        &self.spelling_fields
    }
}
