use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    User,
    Video,
    Comment,
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::User => "User",
                Self::Video => "Video",
                Self::Comment => "Comment",
            }
        )
    }
}

/// Failures of the record store. The analysis core itself never fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    #[error("{kind} already exists: {id}")]
    Duplicate { kind: RecordKind, id: String },
}

impl CatalogError {
    pub fn not_found(kind: RecordKind, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn duplicate(kind: RecordKind, id: &str) -> Self {
        Self::Duplicate {
            kind,
            id: id.to_string(),
        }
    }
}

/// Raised by the menu when stdin reaches end of file.
#[derive(Debug, Error)]
#[error("input closed")]
pub struct InputClosed;
