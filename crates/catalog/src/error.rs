//! Error types for the catalog crate.
//!
//! Storage collaborators and the dataset loader both report through
//! [`CatalogError`]. Absence of data (no friends, no marks) is never an
//! error here; only references to entities that do not exist are.

use crate::types::{FilmId, Mark, UserId};
use thiserror::Error;

/// Errors raised by storage collaborators and the dataset loader.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Referenced user does not exist
    #[error("User {0} not found")]
    UserNotFound(UserId),

    /// Referenced film does not exist
    #[error("Film {0} not found")]
    FilmNotFound(FilmId),

    /// An entity with the same identifier is already registered
    #[error("{entity} with id {id} already exists")]
    AlreadyExists { entity: &'static str, id: u64 },

    /// Mark outside of the accepted range
    #[error("Invalid mark {0}: expected a value between {min} and {max}", min = Mark::MIN, max = Mark::MAX)]
    InvalidMark(i64),

    /// The storage backend failed to apply a mutation
    #[error("Storage failure: {0}")]
    Storage(String),

    /// I/O error occurred while reading a dataset file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Line in a dataset file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    Parse {
        file: String,
        line: usize,
        reason: String,
    },

    /// Dataset record points at an entity that was never declared
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: &'static str, id: u64 },
}

impl CatalogError {
    /// True for the two `NotFound` variants.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UserNotFound(_) | Self::FilmNotFound(_))
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
