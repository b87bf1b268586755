//! Schema and field type system
//!
//! This module defines the fixed wiki schema:
//! - Field kinds (Id, Ngram, Stored, Text)
//! - Languages with dedicated analyzers
//! - The language to content field mapping table

mod field_type;
mod mapping;

pub use field_type::{FieldKind, Language};
pub use mapping::{
    ContentMapping, FieldDef, Schema, CONTENT_EN, CONTENT_IT, LANG, NAME, TITLE,
};
