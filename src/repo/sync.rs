//! Replication between repositories.
//!
//! A [`Remote`] is anything that can answer history queries and accept
//! ancestor-ordered batches of commits. Both [`Repository`] and
//! [`SharedRepository`](crate::repo::SharedRepository) are remotes, so two
//! in-process repositories can clone, push and pull against each other.

use std::collections::HashSet;

use crate::repo::commit::{Commit, CommitMeta};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::repository::Repository;
use crate::repo::traversal;
use crate::repo::types::{BranchName, CommitId};

/// The other side of a clone, push or pull.
pub trait Remote {
    /// Commit a commit-ish resolves to.
    fn get(&self, commitish: &str) -> Option<Commit>;

    /// Id a commit-ish resolves to.
    fn get_id(&self, commitish: &str) -> Option<CommitId>;

    /// Ancestor-ordered commits of `head`, minus the history of `since`.
    fn get_revs(&self, head: &str, since: Option<&str>) -> Vec<Commit>;

    /// Ingest an ancestor-ordered batch, optionally advancing `branch` to its
    /// last commit. Returns how many commits were new.
    fn add_commits(&mut self, commits: Vec<Commit>, branch: Option<&BranchName>)
        -> RepoResult<usize>;

    /// See [`Repository::is_fast_forward`].
    fn is_fast_forward(&self, head: &str, candidate: &[CommitId]) -> Option<Vec<CommitId>>;
}

/// What a pull did to the local branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    /// the remote head was already part of the local branch
    UpToDate,
    /// the branch moved forward over these commits
    FastForward(Vec<CommitId>),
    /// histories diverged and were joined by this merge commit
    Merged(CommitId),
}

impl Repository {
    /// Bulk-insert commits received from elsewhere.
    ///
    /// `commits` must be ancestor-ordered. Known ids are skipped. The whole
    /// batch is checked before anything is inserted, so a dangling or forged
    /// commit leaves the repository untouched.
    pub fn add_commits(
        &mut self,
        commits: Vec<Commit>,
        branch: Option<&BranchName>,
    ) -> RepoResult<usize> {
        if let Some(branch) = branch {
            self.check_branch_name(branch)?;
        }

        let mut pending: HashSet<&CommitId> = HashSet::new();
        for commit in &commits {
            if self.graph.contains(commit.id.as_str()) || pending.contains(&commit.id) {
                continue;
            }
            if let Some(parent) = self.graph.missing_parent(commit, |p| pending.contains(p)) {
                return Err(RepoError::DanglingCommit {
                    id: commit.id.clone(),
                    parent: parent.clone(),
                });
            }
            if self.config.verify_ingested {
                let computed = self.hasher.hash(&commit.unsigned());
                if computed != commit.id {
                    return Err(RepoError::IdMismatch {
                        recorded: commit.id.clone(),
                        computed,
                    });
                }
            }
            pending.insert(&commit.id);
        }
        drop(pending);

        let last = commits.last().map(|c| c.id.clone());
        let mut inserted = 0;
        for commit in commits {
            if self.graph.insert(commit)? {
                inserted += 1;
            }
        }
        if let (Some(branch), Some(last)) = (branch, last) {
            self.refs.set_branch(branch.clone(), last);
        }

        tracing::debug!(inserted, branch = ?branch.map(BranchName::as_str), "commits ingested");
        Ok(inserted)
    }

    /// Populate an empty repository with `branch` from `remote`.
    #[tracing::instrument(skip_all, fields(branch = %branch))]
    pub fn clone<R: Remote + ?Sized>(&mut self, remote: &R, branch: &BranchName) -> RepoResult<usize> {
        if !self.graph.is_empty() {
            return Err(RepoError::CloneOnNonEmptyRepo);
        }
        let revs = remote.get_revs(branch.as_str(), None);
        if revs.is_empty() {
            return Err(RepoError::MissingBranch(branch.to_string()));
        }

        let count = self.add_commits(revs, Some(branch))?;
        tracing::info!(commits = count, "cloned");
        Ok(count)
    }

    /// Send the local `branch` to `remote`.
    ///
    /// The remote must be able to fast-forward; only the commits it lacks are
    /// shipped. Returns their ids.
    #[tracing::instrument(skip_all, fields(branch = %branch))]
    pub fn push<R: Remote + ?Sized>(
        &self,
        remote: &mut R,
        branch: &BranchName,
    ) -> RepoResult<Vec<CommitId>> {
        let head = self
            .refs
            .branch(branch.as_str())
            .ok_or_else(|| RepoError::MissingBranch(branch.to_string()))?;
        let revlist = traversal::revlist(&self.graph, head, None);

        let shipped = match remote.get_id(branch.as_str()) {
            None => revlist,
            Some(remote_head) => remote
                .is_fast_forward(remote_head.as_str(), &revlist)
                .ok_or_else(|| RepoError::NotFastForward {
                    branch: branch.to_string(),
                })?,
        };

        let commits: Vec<Commit> = shipped
            .iter()
            .filter_map(|id| self.graph.get(id.as_str()).cloned())
            .collect();
        remote.add_commits(commits, Some(branch))?;

        tracing::info!(commits = shipped.len(), "pushed");
        Ok(shipped)
    }

    /// Bring `branch` up to date with `remote`.
    ///
    /// `since` limits what the remote sends to history not already reachable
    /// from that commit-ish. If the remote head descends from the local head the
    /// branch fast-forwards; otherwise the fetched commits are ingested and
    /// merged into the branch. A failed merge keeps the fetched commits.
    #[tracing::instrument(skip_all, fields(branch = %branch))]
    pub fn pull<R: Remote + ?Sized>(
        &mut self,
        remote: &R,
        branch: &BranchName,
        since: Option<&str>,
    ) -> RepoResult<PullOutcome> {
        self.check_branch_name(branch)?;
        let remote_head = remote
            .get_id(branch.as_str())
            .ok_or_else(|| RepoError::MissingBranch(branch.to_string()))?;

        let local_head = self.refs.branch(branch.as_str()).cloned();
        if let Some(local) = &local_head {
            if traversal::revlist(&self.graph, local, None).contains(&remote_head) {
                tracing::info!("already up to date");
                return Ok(PullOutcome::UpToDate);
            }
        }

        let revs = remote.get_revs(branch.as_str(), since);
        self.add_commits(revs, None)?;
        if !self.graph.contains(remote_head.as_str()) {
            return Err(RepoError::UnknownCommitish(remote_head.to_string()));
        }

        let ahead = traversal::revlist(&self.graph, &remote_head, local_head.as_ref());
        let descends = match &local_head {
            None => true,
            Some(local) => traversal::revlist(&self.graph, &remote_head, None).contains(local),
        };
        if descends {
            self.refs.set_branch(branch.clone(), remote_head);
            tracing::info!(commits = ahead.len(), "fast-forwarded");
            return Ok(PullOutcome::FastForward(ahead));
        }

        let meta = CommitMeta::message(format!("merge remote {branch}"));
        let merge = self.merge(&[branch.as_str(), remote_head.as_str()], meta)?;
        Ok(PullOutcome::Merged(merge.id.clone()))
    }
}

impl Remote for Repository {
    fn get(&self, commitish: &str) -> Option<Commit> {
        self.resolve(commitish).cloned()
    }

    fn get_id(&self, commitish: &str) -> Option<CommitId> {
        self.resolve_id(commitish)
    }

    fn get_revs(&self, head: &str, since: Option<&str>) -> Vec<Commit> {
        Repository::get_revs(self, head, since)
    }

    fn add_commits(
        &mut self,
        commits: Vec<Commit>,
        branch: Option<&BranchName>,
    ) -> RepoResult<usize> {
        Repository::add_commits(self, commits, branch)
    }

    fn is_fast_forward(&self, head: &str, candidate: &[CommitId]) -> Option<Vec<CommitId>> {
        Repository::is_fast_forward(self, head, candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::World;
    use crate::repo::clock::ManualClock;
    use crate::repo::config::RepositoryConfig;

    fn setup() -> Repository {
        Repository::new().with_clock(ManualClock::default())
    }

    fn lax() -> Repository {
        Repository::with_config(RepositoryConfig::new().verify_ingested(false))
            .with_clock(ManualClock::default())
    }

    fn world(files: Vec<(&str, Vec<&str>)>) -> World {
        files.into_iter().collect()
    }

    fn master() -> BranchName {
        BranchName::new("master").unwrap()
    }

    fn commit(repo: &mut Repository, lines: Vec<&str>) -> CommitId {
        repo.commit(&world(vec![("a.txt", lines)]), &master(), CommitMeta::new())
            .unwrap()
            .id
            .clone()
    }

    #[test]
    fn test_add_commits_is_idempotent() {
        let mut origin = setup();
        commit(&mut origin, vec!["1"]);
        commit(&mut origin, vec!["1", "2"]);
        let revs = origin.get_revs("master", None);

        let mut copy = setup();
        assert_eq!(copy.add_commits(revs.clone(), Some(&master())).unwrap(), 2);
        assert_eq!(copy.add_commits(revs, Some(&master())).unwrap(), 0);
        assert_eq!(copy.graph().len(), 2);
        assert_eq!(copy.resolve_id("master"), origin.resolve_id("master"));
    }

    #[test]
    fn test_add_commits_dangling_leaves_graph_untouched() {
        let mut origin = setup();
        commit(&mut origin, vec!["1"]);
        commit(&mut origin, vec!["1", "2"]);
        let revs = origin.get_revs("master", None);

        let mut copy = setup();
        let err = copy.add_commits(revs[1..].to_vec(), Some(&master())).unwrap_err();
        assert!(matches!(err, RepoError::DanglingCommit { parent, .. } if parent == revs[0].id));
        assert!(copy.is_empty());
        assert!(copy.refs().branches().is_empty());
    }

    #[test]
    fn test_add_commits_is_atomic() {
        let mut origin = setup();
        commit(&mut origin, vec!["1"]);
        let b = commit(&mut origin, vec!["1", "2"]);
        let mut revs = origin.get_revs("master", None);
        // a good first commit followed by an orphan
        let mut orphan = revs[1].clone();
        orphan.parent = Some(CommitId::new("ghost"));
        revs[1] = orphan;

        let mut copy = lax();
        assert!(copy.add_commits(revs, None).is_err());
        assert!(copy.is_empty());
        assert!(copy.resolve(b.as_str()).is_none());
    }

    #[test]
    fn test_add_commits_rejects_forged_id() {
        let mut origin = setup();
        commit(&mut origin, vec!["1"]);
        let mut revs = origin.get_revs("master", None);
        revs[0].message = Some("tampered".into());

        let mut copy = setup();
        let err = copy.add_commits(revs.clone(), None).unwrap_err();
        assert!(matches!(err, RepoError::IdMismatch { .. }));
        assert!(err.is_integrity());

        let mut lax = lax();
        assert_eq!(lax.add_commits(revs, None).unwrap(), 1);
    }

    #[test]
    fn test_clone() {
        let mut origin = setup();
        commit(&mut origin, vec!["1"]);
        commit(&mut origin, vec!["1", "2"]);

        let mut copy = setup();
        assert_eq!(copy.clone(&origin, &master()).unwrap(), 2);
        assert_eq!(copy.checkout("master").unwrap(), origin.checkout("master").unwrap());

        let err = copy.clone(&origin, &master()).unwrap_err();
        assert!(matches!(err, RepoError::CloneOnNonEmptyRepo));

        let mut empty = setup();
        let err = empty
            .clone(&origin, &BranchName::new("nope").unwrap())
            .unwrap_err();
        assert!(matches!(err, RepoError::MissingBranch(_)));
    }

    #[test]
    fn test_push_fast_forward() {
        let mut origin = setup();
        commit(&mut origin, vec!["1"]);
        let mut local = setup();
        local.clone(&origin, &master()).unwrap();

        let c2 = commit(&mut local, vec!["1", "2"]);
        let c3 = commit(&mut local, vec!["1", "2", "3"]);

        let shipped = local.push(&mut origin, &master()).unwrap();
        assert_eq!(shipped, vec![c2, c3.clone()]);
        assert_eq!(origin.resolve_id("master"), Some(c3));

        // nothing left to send
        assert!(local.push(&mut origin, &master()).unwrap().is_empty());
    }

    #[test]
    fn test_push_to_new_branch_ships_everything() {
        let mut local = setup();
        commit(&mut local, vec!["1"]);
        commit(&mut local, vec!["1", "2"]);

        let mut remote = setup();
        let shipped = local.push(&mut remote, &master()).unwrap();
        assert_eq!(shipped.len(), 2);
        assert_eq!(remote.resolve_id("master"), local.resolve_id("master"));
    }

    #[test]
    fn test_push_diverged_is_rejected() {
        let mut origin = setup();
        commit(&mut origin, vec!["1"]);
        let mut local = setup();
        local.clone(&origin, &master()).unwrap();

        commit(&mut origin, vec!["1", "remote"]);
        commit(&mut local, vec!["1", "local"]);
        let remote_head = origin.resolve_id("master");

        let err = local.push(&mut origin, &master()).unwrap_err();
        assert!(matches!(err, RepoError::NotFastForward { .. }));
        assert!(err.is_conflict());
        assert_eq!(origin.resolve_id("master"), remote_head);
    }

    #[test]
    fn test_push_missing_local_branch() {
        let local = setup();
        let mut remote = setup();
        let err = local.push(&mut remote, &master()).unwrap_err();
        assert!(matches!(err, RepoError::MissingBranch(_)));
    }

    #[test]
    fn test_pull_fast_forward_and_up_to_date() {
        let mut origin = setup();
        commit(&mut origin, vec!["1"]);
        let mut local = setup();
        local.clone(&origin, &master()).unwrap();

        let c2 = commit(&mut origin, vec!["1", "2"]);
        let outcome = local.pull(&origin, &master(), None).unwrap();
        assert_eq!(outcome, PullOutcome::FastForward(vec![c2.clone()]));
        assert_eq!(local.resolve_id("master"), Some(c2));

        assert_eq!(local.pull(&origin, &master(), None).unwrap(), PullOutcome::UpToDate);
    }

    #[test]
    fn test_pull_with_since() {
        let mut origin = setup();
        let c1 = commit(&mut origin, vec!["1"]);
        let mut local = setup();
        local.clone(&origin, &master()).unwrap();

        let c2 = commit(&mut origin, vec!["1", "2"]);
        let outcome = local.pull(&origin, &master(), Some(c1.as_str())).unwrap();
        assert_eq!(outcome, PullOutcome::FastForward(vec![c2]));
    }

    #[test]
    fn test_pull_into_unborn_branch() {
        let mut origin = setup();
        commit(&mut origin, vec!["1"]);
        let mut local = setup();

        let outcome = local.pull(&origin, &master(), None).unwrap();
        assert!(matches!(outcome, PullOutcome::FastForward(ids) if ids.len() == 1));
        assert_eq!(local.resolve_id("master"), origin.resolve_id("master"));
    }

    #[test]
    fn test_pull_diverged_merges() {
        let mut origin = setup();
        commit(&mut origin, vec!["a", "b", "c"]);
        let mut local = setup();
        local.clone(&origin, &master()).unwrap();

        let theirs = commit(&mut origin, vec!["a", "b", "C"]);
        let mine = commit(&mut local, vec!["A", "b", "c"]);

        let outcome = local.pull(&origin, &master(), None).unwrap();
        let PullOutcome::Merged(id) = outcome else {
            panic!("expected a merge, got {outcome:?}");
        };
        let merge = local.resolve(id.as_str()).unwrap();
        assert_eq!(merge.parent, Some(mine.clone()));
        assert_eq!(merge.merged, vec![mine, theirs]);
        assert_eq!(local.resolve_id("master"), Some(id));
        assert_eq!(
            local.checkout("master").unwrap(),
            world(vec![("a.txt", vec!["A", "b", "C"])])
        );
    }

    #[test]
    fn test_pull_missing_remote_branch() {
        let origin = setup();
        let mut local = setup();
        let err = local.pull(&origin, &master(), None).unwrap_err();
        assert!(matches!(err, RepoError::MissingBranch(_)));
    }

    #[test]
    fn test_push_then_pull_converges() {
        let mut origin = setup();
        commit(&mut origin, vec!["1"]);

        let mut alice = setup();
        let mut bob = setup();
        alice.clone(&origin, &master()).unwrap();
        bob.clone(&origin, &master()).unwrap();

        commit(&mut alice, vec!["1", "alice"]);
        alice.push(&mut origin, &master()).unwrap();

        bob.pull(&origin, &master(), None).unwrap();
        assert_eq!(bob.resolve_id("master"), origin.resolve_id("master"));
        assert_eq!(bob.checkout("master").unwrap(), alice.checkout("master").unwrap());
    }
}
