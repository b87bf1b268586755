//! Wiki page parsing
//!
//! A page may start with a YAML header delimited by `---` lines:
//!
//! ```text
//! ---
//! title: "My page"
//! language: "it"
//! ---
//! # My document title
//! ```
//!
//! Only `language` is used; other keys are accepted and ignored. A header
//! without a closing marker is treated as part of the body.

use serde::Deserialize;

use crate::error::{Result, VanceError};
use crate::models::Document;

const MARKER: &str = "---";

/// Recognized front matter keys
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageHeader {
    pub language: Option<String>,
}

/// A page split into header and body
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub header: PageHeader,
    pub body: String,
}

impl Page {
    /// Parse raw page text
    pub fn parse(data: &str) -> Result<Self> {
        let Some(after_open) = data.strip_prefix(MARKER) else {
            return Ok(Self::plain(data));
        };
        let Some(mark) = after_open.find(MARKER) else {
            return Ok(Self::plain(data));
        };

        let yaml = &after_open[..mark];
        let rest = &after_open[mark + MARKER.len()..];
        let body = match rest.find('\n') {
            Some(eol) => &rest[eol + 1..],
            None => "",
        };

        let header = if yaml.trim().is_empty() {
            PageHeader::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| VanceError::FrontMatter(e.to_string()))?
        };

        Ok(Self {
            header,
            body: body.to_string(),
        })
    }

    fn plain(data: &str) -> Self {
        Self {
            header: PageHeader::default(),
            body: data.to_string(),
        }
    }

    /// Build the document for `path`; `lang` overrides the declared language
    pub fn into_document(self, path: &str, lang: Option<&str>) -> Document {
        let lang = lang.or(self.header.language.as_deref());
        Document::new(path, lang, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Language;

    #[test]
    fn test_page_with_header() {
        let data = "---\ntitle: \"My page\"\ntags: [general]\nlanguage: it\n---\n# Title\n\nBody.\n";
        let page = Page::parse(data).unwrap();
        assert_eq!(page.header.language.as_deref(), Some("it"));
        assert_eq!(page.body, "# Title\n\nBody.\n");
    }

    #[test]
    fn test_page_without_header() {
        let page = Page::parse("just text\n").unwrap();
        assert_eq!(page.header, PageHeader::default());
        assert_eq!(page.body, "just text\n");
    }

    #[test]
    fn test_unclosed_header_is_body() {
        let data = "---\nlanguage: en\nno closing marker";
        let page = Page::parse(data).unwrap();
        assert!(page.header.language.is_none());
        assert_eq!(page.body, data);
    }

    #[test]
    fn test_header_only() {
        let page = Page::parse("---\nlanguage: en\n---").unwrap();
        assert_eq!(page.header.language.as_deref(), Some("en"));
        assert_eq!(page.body, "");
    }

    #[test]
    fn test_malformed_yaml() {
        let result = Page::parse("---\nlanguage: [unclosed\n---\nbody\n");
        assert!(matches!(result, Err(VanceError::FrontMatter(_))));
    }

    #[test]
    fn test_into_document_override() {
        let page = Page::parse("---\nlanguage: it\n---\nciao\n").unwrap();
        let doc = page.clone().into_document("docs/ciao.md", None);
        assert_eq!(doc.content.language, Some(Language::Italian));
        assert_eq!(doc.name, "ciao");

        let doc = page.into_document("docs/ciao.md", Some("en"));
        assert_eq!(doc.content.language, Some(Language::English));
        assert_eq!(doc.stored_lang(), "en");
    }

    #[test]
    fn test_undeclared_language_is_unknown() {
        let doc = Page::parse("plain").unwrap().into_document("a.txt", None);
        assert_eq!(doc.stored_lang(), "[UNKNOWN]");
        assert!(doc.content.language.is_none());
    }
}
