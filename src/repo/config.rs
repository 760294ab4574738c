//! Repository configuration.

use crate::repo::types::BranchName;

/// Repository configuration options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Branch reported as checked out when no other ref is given.
    pub default_branch: BranchName,
    /// Recompute and check the id of every ingested commit.
    pub verify_ingested: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            default_branch: BranchName::default(),
            verify_ingested: true,
        }
    }
}

impl RepositoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default branch.
    pub fn default_branch(mut self, branch: BranchName) -> Self {
        self.default_branch = branch;
        self
    }

    /// Set verify_ingested flag.
    pub fn verify_ingested(mut self, value: bool) -> Self {
        self.verify_ingested = value;
        self
    }
}
