//! Text analysis
//!
//! Language-aware analyzers for content fields and a character n-gram
//! analyzer for the `name` field.

mod analyzer;
mod field;
mod ngram;

pub use analyzer::{words, Analyzer, Token, TokenStream};
pub use field::{FieldAnalyzer, SchemaAnalyzers};
pub use ngram::NgramAnalyzer;
