//! Content layer error types.

use thiserror::Error;

/// A delta that cannot be applied to the world it was given.
///
/// Stored deltas are produced against the exact parent state, so hitting one
/// of these means the history itself is inconsistent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    /// the delta edits or deletes a file that does not exist
    #[error("cannot patch missing file: {0}")]
    MissingFile(String),

    /// the delta creates a file that already exists
    #[error("file already exists: {0}")]
    FileExists(String),

    /// a hunk reaches past the end of the file
    #[error("hunk out of range in {path}: lines {start}..{end} of {len}")]
    HunkOutOfRange {
        path: String,
        start: usize,
        end: usize,
        len: usize,
    },
}

/// result type alias for content operations
pub type PatchResult<T> = Result<T, PatchError>;
