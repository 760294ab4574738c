//! Ref state snapshots.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::repo::{BranchName, Commit, CommitId, RepoError, RepoResult, Repository, TagName};
use crate::store::error::StoreResult;

/// Branches, tags and the checked-out ref, as persisted next to the log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub branches: BTreeMap<BranchName, CommitId>,
    #[serde(default)]
    pub tags: BTreeMap<TagName, CommitId>,
    /// ref the working copy follows
    #[serde(default)]
    pub current: String,
}

impl Snapshot {
    pub fn from_reader<R: Read>(reader: R) -> StoreResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> StoreResult<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }
}

impl Repository {
    /// Capture the ref tables. `current` falls back to the default branch.
    pub fn snapshot(&self, current: Option<&str>) -> Snapshot {
        Snapshot {
            branches: self.refs.branches().clone(),
            tags: self.refs.tags().clone(),
            current: current
                .map(str::to_string)
                .unwrap_or_else(|| self.config.default_branch.to_string()),
        }
    }

    /// Load persisted history and refs.
    ///
    /// `commits` are ingested as by [`add_commits`](Self::add_commits), then the
    /// ref tables are replaced wholesale. Every ref must point at a known
    /// commit; nothing changes if one does not.
    pub fn restore(&mut self, commits: Vec<Commit>, snapshot: &Snapshot) -> RepoResult<()> {
        let known = |id: &CommitId| {
            self.graph.contains(id.as_str()) || commits.iter().any(|c| &c.id == id)
        };
        let branches = snapshot.branches.iter().map(|(n, id)| (n.as_str(), id));
        let tags = snapshot.tags.iter().map(|(n, id)| (n.as_str(), id));
        if let Some((name, id)) = branches.chain(tags).find(|&(_, id)| !known(id)) {
            return Err(RepoError::DanglingRef {
                name: name.to_string(),
                id: id.clone(),
            });
        }

        let count = self.add_commits(commits, None)?;
        self.refs
            .replace(snapshot.branches.clone(), snapshot.tags.clone());
        tracing::debug!(
            commits = count,
            branches = snapshot.branches.len(),
            tags = snapshot.tags.len(),
            "repository restored"
        );
        Ok(())
    }
}
