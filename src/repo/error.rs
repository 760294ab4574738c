//! Repository error types
//!
//! every hard error here is raised before the graph or the ref table is
//! touched, so a failed operation leaves the repository as it was.

use thiserror::Error;

use crate::content::PatchError;
use crate::repo::types::{CommitId, InvalidNameError};

/// the main error type for repository operations
#[derive(Debug, Error)]
pub enum RepoError {
    /// commit or merge produced an empty delta
    #[error("there are no changes")]
    NoChanges,

    /// an ingested commit refers to a parent that is not known locally
    #[error("dangling commit {id}: parent {parent} is not in the graph")]
    DanglingCommit { id: CommitId, parent: CommitId },

    /// push refused because the histories have diverged
    #[error("cannot push {branch}: not a fast-forward, pull first")]
    NotFastForward { branch: String },

    /// clone was called on a repository that already has commits
    #[error("can only clone into an empty repository")]
    CloneOnNonEmptyRepo,

    /// the branch has no history on the side it was expected on
    #[error("branch not found: {0}")]
    MissingBranch(String),

    /// a commit-ish did not resolve to any commit
    #[error("unknown commit-ish: {0}")]
    UnknownCommitish(String),

    /// the name is already taken by a commit id or a ref of another kind
    #[error("name already in use by a commit or tag: {0}")]
    NameCollision(String),

    /// merge was called with fewer than two refs
    #[error("merge needs at least two refs, got {0}")]
    NothingToMerge(usize),

    /// an ingested commit's id does not match its content
    #[error("commit id mismatch: recorded {recorded}, computed {computed}")]
    IdMismatch { recorded: CommitId, computed: CommitId },

    /// a restored ref points at a commit that is not in the graph
    #[error("ref {name} points at unknown commit {id}")]
    DanglingRef { name: String, id: CommitId },

    /// invalid branch or tag name
    #[error("invalid name: {0}")]
    InvalidName(#[from] InvalidNameError),

    /// a stored delta could not be replayed
    #[error("patch failed: {0}")]
    Patch(#[from] PatchError),
}

impl RepoError {
    /// check if this error indicates the resource doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RepoError::MissingBranch(_) | RepoError::UnknownCommitish(_)
        )
    }

    /// check if this error means local and remote history disagree
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            RepoError::NotFastForward { .. }
                | RepoError::NameCollision(_)
                | RepoError::CloneOnNonEmptyRepo
        )
    }

    /// check if this error points at corrupt or inconsistent history
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            RepoError::DanglingCommit { .. }
                | RepoError::DanglingRef { .. }
                | RepoError::IdMismatch { .. }
                | RepoError::Patch(_)
        )
    }
}

/// result type alias for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
