//! Core types for the inverted index

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense document number, assigned in insertion order
///
/// A re-upserted document receives a fresh docno, so ordering by docno is
/// ordering by last write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocNo(pub u32);

impl DocNo {
    pub fn new(n: u32) -> Self {
        Self(n)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for DocNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc_{}", self.0)
    }
}

/// A single posting entry within a posting list
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub docno: DocNo,
    /// Term frequency in this document
    pub term_frequency: u32,
    /// Token positions, ascending
    pub positions: Vec<u32>,
}

impl Posting {
    pub fn with_positions(docno: DocNo, positions: Vec<u32>) -> Self {
        Self {
            docno,
            term_frequency: positions.len() as u32,
            positions,
        }
    }
}

/// A term's postings, sorted by docno
pub type PostingList = Vec<Posting>;
