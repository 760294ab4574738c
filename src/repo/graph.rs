//! The commit DAG.

use std::collections::HashMap;

use crate::repo::commit::Commit;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::types::CommitId;

/// Append-only map of commit id to commit.
///
/// A commit can only be inserted once every commit it points at is present,
/// so the graph never holds a dangling reference.
#[derive(Debug, Clone, Default)]
pub struct CommitGraph {
    commits: HashMap<CommitId, Commit>,
}

impl CommitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Commit> {
        self.commits.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.commits.contains_key(id)
    }

    /// depth of a commit, 0 for `None` or an unknown id
    pub fn depth(&self, id: Option<&CommitId>) -> u64 {
        id.and_then(|id| self.commits.get(id))
            .map_or(0, |c| c.depth)
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Commit> {
        self.commits.values()
    }

    /// First parent link of `commit` that is neither in the graph nor in
    /// `pending`.
    pub(crate) fn missing_parent<'a>(
        &self,
        commit: &'a Commit,
        pending: impl Fn(&CommitId) -> bool,
    ) -> Option<&'a CommitId> {
        commit
            .parents()
            .find(|p| !self.contains(p.as_str()) && !pending(p))
    }

    /// Insert a commit whose parents are all present.
    ///
    /// Returns `false` if the id was already known (the existing record wins).
    pub fn insert(&mut self, commit: Commit) -> RepoResult<bool> {
        if self.contains(commit.id.as_str()) {
            return Ok(false);
        }

        if let Some(parent) = self.missing_parent(&commit, |_| false) {
            return Err(RepoError::DanglingCommit {
                id: commit.id.clone(),
                parent: parent.clone(),
            });
        }

        self.commits.insert(commit.id.clone(), commit);
        Ok(true)
    }

    /// Insert a commit minted locally and hand back the stored record.
    pub(crate) fn insert_new(&mut self, commit: Commit) -> RepoResult<&Commit> {
        if let Some(parent) = self.missing_parent(&commit, |_| false) {
            return Err(RepoError::DanglingCommit {
                id: commit.id.clone(),
                parent: parent.clone(),
            });
        }
        Ok(self.commits.entry(commit.id.clone()).or_insert(commit))
    }
}
