use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::schema::Language;

/// Stored marker for documents without a declared language
pub const UNKNOWN_LANG: &str = "[UNKNOWN]";

/// Body text tagged with the language it is written in
///
/// `language` is `None` when the page declares no language, or declares one
/// without a dedicated analyzer; such bodies are fanned out to every content
/// field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentField {
    pub language: Option<Language>,
    pub body: String,
}

impl ContentField {
    pub fn new(language: Option<Language>, body: impl Into<String>) -> Self {
        Self {
            language,
            body: body.into(),
        }
    }
}

/// A wiki page ready to be indexed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Repository-relative path, the unique key
    pub title: String,
    /// Final path segment without its extension
    pub name: String,
    /// Declared language tag as written, if any
    pub lang: Option<String>,
    pub content: ContentField,
}

impl Document {
    /// Build a document from its path, declared language tag and body
    pub fn new(title: impl Into<String>, lang: Option<&str>, body: impl Into<String>) -> Self {
        let title = title.into();
        let lang = lang
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        let language = lang.as_deref().and_then(Language::from_tag);

        Self {
            name: extract_name(&title),
            title,
            lang,
            content: ContentField::new(language, body),
        }
    }

    /// Language tag stored with the document
    pub fn stored_lang(&self) -> &str {
        self.lang.as_deref().unwrap_or(UNKNOWN_LANG)
    }
}

/// Final path segment without its extension (`docs/design-notes.md` -> `design-notes`)
pub fn extract_name(path: &str) -> String {
    let path = Path::new(path);
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// A document as held by an index snapshot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub title: String,
    pub name: String,
    pub lang: String,
    /// Body per physical content field it was written to
    pub contents: BTreeMap<String, String>,
}

impl StoredDocument {
    pub fn content(&self, field: &str) -> Option<&str> {
        self.contents.get(field).map(String::as_str)
    }
}
