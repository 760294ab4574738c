//!  Branch and tag management.
//!
//!  refs are names pointing at commits:
//! - branches move every time a commit or merge targets them
//! - tags are bound once and meant to stay put
//!
//! The table itself knows nothing about commits. The collision guard against
//! commit ids lives in [`Repository`](crate::repo::Repository), which owns both
//! the table and the graph.

use std::collections::BTreeMap;

use crate::repo::types::{BranchName, CommitId, TagName};

/// Branch and tag name → commit id mappings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefTable {
    branches: BTreeMap<BranchName, CommitId>,
    tags: BTreeMap<TagName, CommitId>,
}

impl RefTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a branch name to its current head.
    pub fn branch(&self, name: &str) -> Option<&CommitId> {
        self.branches.get(name)
    }

    pub fn tag(&self, name: &str) -> Option<&CommitId> {
        self.tags.get(name)
    }

    pub fn is_branch(&self, name: &str) -> bool {
        self.branches.contains_key(name)
    }

    pub fn is_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub fn branches(&self) -> &BTreeMap<BranchName, CommitId> {
        &self.branches
    }

    pub fn tags(&self) -> &BTreeMap<TagName, CommitId> {
        &self.tags
    }

    /// Point a branch at a commit. Collision checks are the caller's job.
    pub(crate) fn set_branch(&mut self, name: BranchName, target: CommitId) -> Option<CommitId> {
        self.branches.insert(name, target)
    }

    pub(crate) fn set_tag(&mut self, name: TagName, target: CommitId) -> Option<CommitId> {
        self.tags.insert(name, target)
    }

    /// Swap in whole tables (used when restoring persisted state).
    pub(crate) fn replace(
        &mut self,
        branches: BTreeMap<BranchName, CommitId>,
        tags: BTreeMap<TagName, CommitId>,
    ) {
        self.branches = branches;
        self.tags = tags;
    }
}
