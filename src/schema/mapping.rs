//! Wiki document schema
//!
//! The schema is fixed: a unique `title`, an n-gram `name`, a stored `lang`
//! and one analyzed content field per supported language. Content is routed to
//! physical fields through an explicit language table.

use serde::{Deserialize, Serialize};

use super::field_type::{FieldKind, Language};
use crate::config::NgramConfig;
use crate::error::{Result, VanceError};

pub const TITLE: &str = "title";
pub const NAME: &str = "name";
pub const LANG: &str = "lang";
pub const CONTENT_IT: &str = "content_it";
pub const CONTENT_EN: &str = "content_en";

/// Definition of a single field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    /// Multiplicative weight applied to this field's relevance score
    #[serde(default = "default_boost")]
    pub boost: f32,
}

fn default_boost() -> f32 {
    1.0
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            boost: 1.0,
        }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }
}

/// Mapping from a language to the physical content field holding it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentMapping {
    pub language: Language,
    pub field: String,
}

/// Index schema
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub version: u32,
    pub fields: Vec<FieldDef>,
    pub content_fields: Vec<ContentMapping>,
}

impl Schema {
    pub const VERSION: u32 = 1;

    /// The wiki schema with default n-gram sizes
    pub fn wiki() -> Self {
        Self::wiki_with_ngrams(&NgramConfig::default())
    }

    /// The wiki schema
    pub fn wiki_with_ngrams(ngram: &NgramConfig) -> Self {
        Self {
            version: Self::VERSION,
            fields: vec![
                FieldDef::new(TITLE, FieldKind::Id),
                FieldDef::new(
                    NAME,
                    FieldKind::Ngram {
                        min_gram: ngram.min_gram,
                        max_gram: ngram.max_gram,
                    },
                )
                .with_boost(1.5),
                FieldDef::new(LANG, FieldKind::Stored),
                FieldDef::new(
                    CONTENT_IT,
                    FieldKind::Text {
                        language: Language::Italian,
                        spelling: true,
                    },
                ),
                FieldDef::new(
                    CONTENT_EN,
                    FieldKind::Text {
                        language: Language::English,
                        spelling: true,
                    },
                ),
            ],
            content_fields: vec![
                ContentMapping {
                    language: Language::Italian,
                    field: CONTENT_IT.to_string(),
                },
                ContentMapping {
                    language: Language::English,
                    field: CONTENT_EN.to_string(),
                },
            ],
        }
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields that produce postings, in schema order
    pub fn indexed_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.kind.is_indexed())
    }

    /// Searchable fields with their boosts
    pub fn field_weights(&self) -> Vec<(String, f32)> {
        self.indexed_fields()
            .map(|f| (f.name.clone(), f.boost))
            .collect()
    }

    /// Physical content fields, in mapping order
    pub fn content_field_names(&self) -> impl Iterator<Item = &str> {
        self.content_fields.iter().map(|m| m.field.as_str())
    }

    /// The content field holding text in the given language
    pub fn content_field_for(&self, language: Language) -> Option<&str> {
        self.content_fields
            .iter()
            .find(|m| m.language == language)
            .map(|m| m.field.as_str())
    }

    /// Resolve the fields a body is written to.
    ///
    /// A body in a mapped language goes to that language's field only. Any
    /// other body is fanned out to every content field.
    pub fn content_fields_for(&self, language: Option<Language>) -> Vec<&str> {
        match language.and_then(|l| self.content_field_for(l)) {
            Some(field) => vec![field],
            None => self.content_field_names().collect(),
        }
    }

    /// Compact description of the schema, used in mismatch errors
    pub fn describe(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("{}:{}", f.name, f.kind.describe()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Fail with `SchemaMismatch` unless `other` has the same fields
    pub fn ensure_compatible(&self, other: &Schema) -> Result<()> {
        if self.fields != other.fields || self.content_fields != other.content_fields {
            return Err(VanceError::SchemaMismatch {
                expected: self.describe(),
                actual: other.describe(),
            });
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| VanceError::Internal(e.to_string()))
    }

    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data)
            .map_err(|e| VanceError::Corrupted(format!("unreadable schema: {}", e)))
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::wiki()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wiki_schema_fields() {
        let schema = Schema::wiki();
        assert_eq!(schema.fields.len(), 5);
        assert_eq!(schema.field(NAME).unwrap().boost, 1.5);
        assert!(schema.field(LANG).is_some());
        assert!(schema.field("body").is_none());

        let indexed: Vec<_> = schema.indexed_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(indexed, vec![NAME, CONTENT_IT, CONTENT_EN]);
    }

    #[test]
    fn test_content_field_routing() {
        let schema = Schema::wiki();
        assert_eq!(
            schema.content_fields_for(Some(Language::English)),
            vec![CONTENT_EN]
        );
        assert_eq!(
            schema.content_fields_for(Some(Language::Italian)),
            vec![CONTENT_IT]
        );
        // Unknown language: fallback fan-out
        assert_eq!(schema.content_fields_for(None), vec![CONTENT_IT, CONTENT_EN]);
    }

    #[test]
    fn test_schema_compatibility() {
        let schema = Schema::wiki();
        assert!(schema.ensure_compatible(&Schema::wiki()).is_ok());

        let other = Schema::wiki_with_ngrams(&NgramConfig {
            min_gram: 3,
            max_gram: 5,
        });
        let err = schema.ensure_compatible(&other).unwrap_err();
        assert!(matches!(err, VanceError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_schema_json_roundtrip() {
        let schema = Schema::wiki();
        let bytes = schema.to_json().unwrap();
        assert_eq!(Schema::from_json(&bytes).unwrap(), schema);
        assert!(Schema::from_json(b"{").is_err());
    }
}
