//! Immutable index generations
//!
//! A snapshot is the complete state of the index at one generation: stored
//! documents, the key table and one `FieldIndex` per indexed field. Commits
//! clone the current snapshot (a shallow copy of `Arc`s) and copy-on-write only
//! the fields a change touches.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;

use super::postings::FieldIndex;
use super::term_dict::SpellingDictionary;
use super::types::DocNo;
use crate::error::{Result, VanceError};
use crate::models::{Document, StoredDocument};
use crate::schema::{Schema, NAME};
use crate::tokenizer::SchemaAnalyzers;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IndexSnapshot {
    generation: u64,
    next_docno: DocNo,
    documents: BTreeMap<DocNo, Arc<StoredDocument>>,
    keys: BTreeMap<String, DocNo>,
    fields: BTreeMap<String, Arc<FieldIndex>>,
    /// Rebuilt from field vocabularies, never persisted
    #[serde(skip)]
    dictionaries: BTreeMap<String, Arc<SpellingDictionary>>,
}

impl IndexSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    pub fn doc_count(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Look up a document and its docno by key
    pub fn get(&self, title: &str) -> Option<(DocNo, &StoredDocument)> {
        let docno = *self.keys.get(title)?;
        self.documents.get(&docno).map(|doc| (docno, doc.as_ref()))
    }

    pub fn document(&self, docno: DocNo) -> Option<&StoredDocument> {
        self.documents.get(&docno).map(Arc::as_ref)
    }

    /// Documents in insertion order
    pub fn documents(&self) -> impl Iterator<Item = (DocNo, &StoredDocument)> {
        self.documents.iter().map(|(docno, doc)| (*docno, doc.as_ref()))
    }

    pub fn field(&self, name: &str) -> Option<&FieldIndex> {
        self.fields.get(name).map(Arc::as_ref)
    }

    pub fn dictionary(&self, field: &str) -> Option<&SpellingDictionary> {
        self.dictionaries.get(field).map(Arc::as_ref)
    }

    /// Replace the document with the same title, assigning a fresh docno
    pub(crate) fn upsert(
        &mut self,
        doc: &Document,
        schema: &Schema,
        analyzers: &SchemaAnalyzers,
    ) -> DocNo {
        self.delete(&doc.title);

        let docno = self.next_docno;
        self.next_docno = docno.next();

        let contents: BTreeMap<String, String> = schema
            .content_fields_for(doc.content.language)
            .into_iter()
            .map(|field| (field.to_string(), doc.content.body.clone()))
            .collect();

        self.index_value(docno, NAME, &doc.name, analyzers);
        for (field, body) in &contents {
            self.index_value(docno, field, body, analyzers);
        }

        let stored = StoredDocument {
            title: doc.title.clone(),
            name: doc.name.clone(),
            lang: doc.stored_lang().to_string(),
            contents,
        };
        self.keys.insert(doc.title.clone(), docno);
        self.documents.insert(docno, Arc::new(stored));
        docno
    }

    fn index_value(&mut self, docno: DocNo, field: &str, value: &str, analyzers: &SchemaAnalyzers) {
        let Some(analyzer) = analyzers.get(field) else {
            return;
        };
        let tokens = analyzer.index_tokens(value);
        let words = analyzers.vocabulary_words(field, value);
        let index = self.fields.entry(field.to_string()).or_default();
        Arc::make_mut(index).add_document(docno, tokens, words);
    }

    /// Remove a document by key; returns whether it existed
    pub(crate) fn delete(&mut self, title: &str) -> bool {
        let Some(docno) = self.keys.remove(title) else {
            return false;
        };
        let Some(stored) = self.documents.remove(&docno) else {
            return false;
        };

        let touched = std::iter::once(NAME).chain(stored.contents.keys().map(String::as_str));
        for field in touched {
            if let Some(index) = self.fields.get_mut(field) {
                Arc::make_mut(index).remove_document(docno);
            }
        }
        true
    }

    /// Rebuild spelling dictionaries of fields that changed since `previous`
    pub(crate) fn refresh_dictionaries(
        &mut self,
        previous: &IndexSnapshot,
        spelling_fields: &[String],
    ) -> io::Result<()> {
        for field in spelling_fields {
            let Some(index) = self.fields.get(field) else {
                self.dictionaries.remove(field);
                continue;
            };
            let unchanged = previous
                .fields
                .get(field)
                .is_some_and(|old| Arc::ptr_eq(old, index));
            if unchanged && previous.dictionaries.contains_key(field) {
                continue;
            }
            let dictionary = SpellingDictionary::from_counts(index.vocabulary())?;
            self.dictionaries.insert(field.clone(), Arc::new(dictionary));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a persisted snapshot and rebuild its dictionaries
    pub fn from_bytes(data: &[u8], spelling_fields: &[String]) -> Result<Self> {
        let mut snapshot: IndexSnapshot = bincode::deserialize(data)?;
        snapshot
            .refresh_dictionaries(&IndexSnapshot::new(), spelling_fields)
            .map_err(|e| VanceError::Corrupted(format!("vocabulary rebuild failed: {}", e)))?;
        Ok(snapshot)
    }
}
