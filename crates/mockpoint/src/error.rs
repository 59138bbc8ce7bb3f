//! Error types shared by every mockpoint module.

use crate::repository::EntryId;
use std::fmt;

/// What a failed lookup was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Index(usize),
    Id(EntryId),
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Index(index) => write!(f, "index {index}"),
            Lookup::Id(id) => write!(f, "id {id}"),
        }
    }
}

/// Errors reported by rule construction, repository operations and persistence
#[derive(Debug, thiserror::Error)]
pub enum MockError {
    #[error("Invalid rule: {0}")]
    InvalidRule(String),
    #[error("No mock entry at {0}")]
    NotFound(Lookup),
    #[error("Invalid move of rows {from}..={to} to {dest} (repository holds {len} entries)")]
    InvalidRange {
        from: usize,
        to: usize,
        dest: usize,
        len: usize,
    },
    #[error("Corrupt persisted data: {0}")]
    CorruptData(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MockError>;
