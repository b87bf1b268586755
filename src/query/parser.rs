//! Query string parser
//!
//! # Grammar
//!
//! ```text
//! query   := clause ((AND | OR)? clause)*
//! clause  := '-'? (FIELD ':')? (WORD | QUOTED)
//! ```
//!
//! Bare clauses are required. `OR` turns both of its neighbours into optional
//! clauses. Input that does not fit the grammar is re-read as plain words.

use tracing::debug;

use super::lexer::{Lexer, Token};
use super::types::{Clause, ClauseKind, Occur, Query};
use crate::error::{Result, VanceError};
use crate::schema::Schema;
use crate::tokenizer::words;

/// Parses query strings into weighted multi-field queries
#[derive(Clone, Debug)]
pub struct QueryParser {
    field_weights: Vec<(String, f32)>,
    tie_breaker: f32,
}

impl QueryParser {
    pub fn new(field_weights: Vec<(String, f32)>, tie_breaker: f32) -> Self {
        Self {
            field_weights,
            tie_breaker,
        }
    }

    /// Parser over every searchable field of a schema, with its boosts
    pub fn for_schema(schema: &Schema, tie_breaker: f32) -> Self {
        Self::new(schema.field_weights(), tie_breaker)
    }

    /// Parser restricted to a single field
    pub fn for_field(field: impl Into<String>) -> Self {
        Self::new(vec![(field.into(), 1.0)], 0.0)
    }

    /// Parse a query string
    ///
    /// Malformed syntax degrades to a query of plain required words. Fails with
    /// `EmptyQuery` only when nothing searchable remains.
    pub fn parse(&self, input: &str) -> Result<Query> {
        if input.trim().is_empty() {
            return Err(VanceError::EmptyQuery);
        }

        let clauses = match self.parse_strict(input) {
            Ok(clauses) => clauses,
            Err(e) => {
                debug!(query = input, error = %e, "falling back to literal terms");
                self.literal_clauses(input)
            }
        };

        if !clauses.iter().any(|c| c.occur != Occur::MustNot) {
            return Err(VanceError::EmptyQuery);
        }

        Ok(Query {
            clauses,
            field_weights: self.field_weights.clone(),
            tie_breaker: self.tie_breaker,
        })
    }

    fn parse_strict(&self, input: &str) -> Result<Vec<Clause>> {
        let tokens = Lexer::new(input).tokenize()?;
        let mut clauses: Vec<Clause> = Vec::new();
        let mut pending_or = false;
        let mut i = 0;

        while i < tokens.len() {
            match &tokens[i] {
                Token::Or => {
                    if clauses.is_empty() || pending_or {
                        return Err(VanceError::QueryParse("dangling OR".to_string()));
                    }
                    pending_or = true;
                    i += 1;
                    continue;
                }
                Token::And => {
                    if clauses.is_empty() || pending_or {
                        return Err(VanceError::QueryParse("dangling AND".to_string()));
                    }
                    i += 1;
                    continue;
                }
                _ => {}
            }

            let (clause, consumed) = self.parse_clause(&tokens[i..])?;
            i += consumed;

            let Some(mut clause) = clause else {
                if pending_or {
                    return Err(VanceError::QueryParse("OR without operand".to_string()));
                }
                continue;
            };

            if pending_or {
                if clause.occur == Occur::MustNot {
                    return Err(VanceError::QueryParse("OR before excluded clause".to_string()));
                }
                if let Some(previous) = clauses.last_mut() {
                    if previous.occur == Occur::MustNot {
                        return Err(VanceError::QueryParse(
                            "OR after excluded clause".to_string(),
                        ));
                    }
                    previous.occur = Occur::Should;
                }
                clause.occur = Occur::Should;
                pending_or = false;
            }
            clauses.push(clause);
        }

        if pending_or {
            return Err(VanceError::QueryParse("dangling OR".to_string()));
        }
        Ok(clauses)
    }

    /// Parse one clause from the head of `tokens`
    ///
    /// Returns the clause (`None` when it holds no searchable word) and the
    /// number of tokens consumed.
    fn parse_clause(&self, tokens: &[Token]) -> Result<(Option<Clause>, usize)> {
        let mut i = 0;
        let mut occur = Occur::Must;

        if tokens.first() == Some(&Token::Minus) {
            occur = Occur::MustNot;
            i += 1;
        }

        let mut field = None;
        if let (Some(Token::Word(name)), Some(Token::Colon)) = (tokens.get(i), tokens.get(i + 1)) {
            if !self.field_weights.iter().any(|(f, _)| f == name) {
                return Err(VanceError::QueryParse(format!("unknown field: {}", name)));
            }
            field = Some(name.clone());
            i += 2;
        }

        let kind = match tokens.get(i) {
            Some(Token::Word(word)) => ClauseKind::Term(word.clone()),
            Some(Token::Quoted(phrase)) => {
                let phrase_words: Vec<String> = words(phrase).collect();
                if phrase_words.len() == 1 {
                    ClauseKind::Term(phrase.trim().to_string())
                } else {
                    ClauseKind::Phrase(phrase.clone())
                }
            }
            Some(other) => {
                return Err(VanceError::QueryParse(format!("unexpected token {:?}", other)))
            }
            None => return Err(VanceError::QueryParse("missing operand".to_string())),
        };
        i += 1;

        let searchable = match &kind {
            ClauseKind::Term(text) | ClauseKind::Phrase(text) => words(text).next().is_some(),
        };
        let clause = searchable.then_some(Clause { kind, occur, field });
        Ok((clause, i))
    }

    /// Every word of the input as a required term
    fn literal_clauses(&self, input: &str) -> Vec<Clause> {
        words(input)
            .map(|word| Clause {
                kind: ClauseKind::Term(word),
                occur: Occur::Must,
                field: None,
            })
            .collect()
    }
}
