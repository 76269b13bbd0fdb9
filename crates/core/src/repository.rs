//! Persistence boundary shared by every repository trait.

use thiserror::Error;

use crate::error::{DomainError, Reason};

/// Failure reported by a repository implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The addressed record does not exist.
    #[error("record not found")]
    NotFound,

    /// A uniqueness (or similar) constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Anything else (connection loss, decode failure, poisoned lock).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl RepositoryError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Translate into the domain taxonomy; `not_found` names the entity.
    pub fn into_domain(self, not_found: Reason) -> DomainError {
        match self {
            RepositoryError::NotFound => DomainError::not_found(not_found),
            RepositoryError::Conflict(msg) => DomainError::conflict(Reason::AlreadyExists, msg),
            RepositoryError::Backend(msg) => DomainError::internal(msg),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Records matching a query, already windowed, plus the pre-window count.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}
