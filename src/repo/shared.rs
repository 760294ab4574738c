//! Thread-safe handle around a [`Repository`].

use std::sync::Arc;

use parking_lot::RwLock;

use crate::content::World;
use crate::repo::commit::{Commit, CommitMeta};
use crate::repo::error::RepoResult;
use crate::repo::repository::Repository;
use crate::repo::sync::Remote;
use crate::repo::types::{BranchName, CommitId};

/// A repository shared between threads.
///
/// Clone this to share across threads - it uses Arc internally. Readers run
/// concurrently, writers are serialized by the lock. It is also a [`Remote`],
/// so other repositories can clone, push and pull against it.
///
/// The lock is not reentrant. A closure passed to [`with_repo`](Self::with_repo)
/// or [`with_repo_mut`](Self::with_repo_mut) must not reach the same handle
/// again, for example by using one of its clones as the remote of a pull,
/// or it deadlocks. Two distinct handles may be used together.
#[derive(Clone, Default)]
pub struct SharedRepository {
    inner: Arc<RwLock<Repository>>,
}

impl SharedRepository {
    pub fn new(repo: Repository) -> Self {
        Self {
            inner: Arc::new(RwLock::new(repo)),
        }
    }

    /// Execute a function with read access to the repository.
    pub fn with_repo<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&Repository) -> T,
    {
        let repo = self.inner.read();
        f(&repo)
    }

    /// Execute a function with write access to the repository.
    ///
    /// Holds the write lock while `f` runs, so `f` must not touch this handle
    /// or any clone of it.
    pub fn with_repo_mut<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut Repository) -> T,
    {
        let mut repo = self.inner.write();
        f(&mut repo)
    }

    // ==================== High-level Operations ====================

    pub fn resolve_id(&self, commitish: &str) -> Option<CommitId> {
        self.with_repo(|repo| repo.resolve_id(commitish))
    }

    pub fn checkout(&self, commitish: &str) -> RepoResult<World> {
        self.with_repo(|repo| repo.checkout(commitish))
    }

    /// Commit and return a copy of the new record.
    pub fn commit(&self, world: &World, branch: &BranchName, meta: CommitMeta) -> RepoResult<Commit> {
        self.with_repo_mut(|repo| repo.commit(world, branch, meta).cloned())
    }

    pub fn merge(&self, refs: &[&str], meta: CommitMeta) -> RepoResult<Commit> {
        self.with_repo_mut(|repo| repo.merge(refs, meta).cloned())
    }

    pub fn branch(&self, name: &BranchName, commitish: &str) -> bool {
        self.with_repo_mut(|repo| repo.branch(name, commitish))
    }
}

impl std::fmt::Debug for SharedRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.with_repo(|repo| f.debug_tuple("SharedRepository").field(repo).finish())
    }
}

impl Remote for SharedRepository {
    fn get(&self, commitish: &str) -> Option<Commit> {
        self.with_repo(|repo| repo.resolve(commitish).cloned())
    }

    fn get_id(&self, commitish: &str) -> Option<CommitId> {
        self.resolve_id(commitish)
    }

    fn get_revs(&self, head: &str, since: Option<&str>) -> Vec<Commit> {
        self.with_repo(|repo| repo.get_revs(head, since))
    }

    fn add_commits(
        &mut self,
        commits: Vec<Commit>,
        branch: Option<&BranchName>,
    ) -> RepoResult<usize> {
        self.with_repo_mut(|repo| repo.add_commits(commits, branch))
    }

    fn is_fast_forward(&self, head: &str, candidate: &[CommitId]) -> Option<Vec<CommitId>> {
        self.with_repo(|repo| repo.is_fast_forward(head, candidate))
    }
}
