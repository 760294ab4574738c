//! Store error types

use std::path::PathBuf;

use thiserror::Error;

use crate::repo::RepoError;

/// the main error type for persistence
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error (filesystem level)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// a commit log line is not a valid commit record
    #[error("malformed commit log at line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// the directory holds no store
    #[error("store not initialized: {0}")]
    NotInitialized(PathBuf),

    /// loaded history was rejected by the repository
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl StoreError {
    /// check if the on-disk data itself is broken
    pub fn is_corrupt(&self) -> bool {
        match self {
            StoreError::Json { .. } | StoreError::Serialization(_) => true,
            StoreError::Repo(e) => e.is_integrity(),
            _ => false,
        }
    }
}

/// result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
