//! Query parsing and execution
//!
//! The search box syntax supports:
//! - bare words (all required)
//! - `a OR b` (optional clauses, at least one must match)
//! - `-word` (excluded in every field)
//! - `"quoted phrases"` (consecutive positions)
//! - `field:word` (clause restricted to one field)
//!
//! ```text
//! "release notes" name:design -draft
//! ```
//!
//! Parsed queries run through [`QueryExecutor`]; hits are turned into snippets
//! by the [`Highlighter`] and misspelled queries get a suggestion from the
//! [`SpellingCorrector`].

pub mod executor;
pub mod highlight;
pub mod lexer;
pub mod parser;
pub mod spelling;
pub mod types;

pub use executor::QueryExecutor;
pub use highlight::Highlighter;
pub use parser::QueryParser;
pub use spelling::{suggest, SpellingCorrector};
pub use types::{Clause, ClauseKind, Hit, Occur, Query};
