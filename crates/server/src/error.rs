//! Service-level errors.

use catalog::{CatalogError, UserId};
use std::fmt;
use thiserror::Error;

/// Which symmetric friend mutation was in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendOp {
    Add,
    Remove,
}

impl fmt::Display for FriendOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FriendOp::Add => write!(f, "add friend"),
            FriendOp::Remove => write!(f, "remove friend"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Not found, already exists, invalid mark and storage failures
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// One direction of a friendship was written and the other was not.
    /// The stored relation is asymmetric until the same call is retried.
    #[error("{operation} left half-applied: edge {from} -> {to} could not be written: {source}")]
    PartialFailure {
        operation: FriendOp,
        from: UserId,
        to: UserId,
        #[source]
        source: CatalogError,
    },

    #[error("User {0} cannot befriend themselves")]
    SelfFriendship(UserId),

    #[error("{task} task failed: {source}")]
    Task {
        task: &'static str,
        #[source]
        source: tokio::task::JoinError,
    },
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Catalog(e) if e.is_not_found())
    }

    pub fn is_partial_failure(&self) -> bool {
        matches!(self, ServiceError::PartialFailure { .. })
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_errors_pass_through() {
        let err: ServiceError = CatalogError::UserNotFound(7).into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), CatalogError::UserNotFound(7).to_string());
    }

    #[test]
    fn test_partial_failure_message() {
        let err = ServiceError::PartialFailure {
            operation: FriendOp::Add,
            from: 2,
            to: 1,
            source: CatalogError::Storage("disk full".to_string()),
        };
        assert!(err.is_partial_failure());
        assert!(!err.is_not_found());
        let message = err.to_string();
        assert!(message.contains("add friend"));
        assert!(message.contains("2 -> 1"));
    }
}
