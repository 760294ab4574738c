//!   The repository aggregate.
//!
//!  This is the central component of the engine. It owns the commit graph and
//!  the ref table, holds the injected differ, hasher and clock, and provides
//!  the operations the rest of the system uses: resolution, commits,
//!  checkout and ref updates. Merging lives in `merge.rs` and syncing in
//!  `sync.rs`, both as further `impl Repository` blocks.

use std::fmt;

use crate::content::{ContentDiffer, Delta, LineDiffer, World};
use crate::repo::clock::{Clock, SystemClock};
use crate::repo::commit::{Commit, CommitBuilder, CommitMeta};
use crate::repo::config::RepositoryConfig;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::graph::CommitGraph;
use crate::repo::hash::{ContentHasher, Sha256Hasher};
use crate::repo::refs::RefTable;
use crate::repo::traversal;
use crate::repo::types::{BranchName, CommitId, Reference, TagName};

/// An in-memory repository.
///
/// Mutating operations take `&mut self`; share one between threads through
/// [`SharedRepository`](crate::repo::SharedRepository).
pub struct Repository {
    pub(crate) graph: CommitGraph,
    pub(crate) refs: RefTable,
    pub(crate) config: RepositoryConfig,
    pub(crate) differ: Box<dyn ContentDiffer>,
    pub(crate) hasher: Box<dyn ContentHasher>,
    pub(crate) clock: Box<dyn Clock>,
}

impl Repository {
    /// Create an empty repository with the built-in collaborators.
    pub fn new() -> Self {
        Self::with_config(RepositoryConfig::default())
    }

    pub fn with_config(config: RepositoryConfig) -> Self {
        Self {
            graph: CommitGraph::new(),
            refs: RefTable::new(),
            config,
            differ: Box::new(LineDiffer),
            hasher: Box::new(Sha256Hasher),
            clock: Box::new(SystemClock),
        }
    }

    /// Use a different content differ.
    pub fn with_differ(mut self, differ: impl ContentDiffer + 'static) -> Self {
        self.differ = Box::new(differ);
        self
    }

    /// Use a different commit hasher.
    pub fn with_hasher(mut self, hasher: impl ContentHasher + 'static) -> Self {
        self.hasher = Box::new(hasher);
        self
    }

    /// Use a different clock (tests inject a `ManualClock`).
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn graph(&self) -> &CommitGraph {
        &self.graph
    }

    pub fn refs(&self) -> &RefTable {
        &self.refs
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    // ==================== Resolution ====================

    /// What `commitish` names: a commit id, then a branch, then a tag.
    pub fn reference(&self, commitish: &str) -> Option<Reference> {
        if let Some(commit) = self.graph.get(commitish) {
            return Some(Reference::Commit(commit.id.clone()));
        }
        if let Some((name, _)) = self.refs.branches().get_key_value(commitish) {
            return Some(Reference::Branch(name.clone()));
        }
        self.refs
            .tags()
            .get_key_value(commitish)
            .map(|(name, _)| Reference::Tag(name.clone()))
    }

    /// Look up the commit a commit-ish points at.
    pub fn resolve(&self, commitish: &str) -> Option<&Commit> {
        if let Some(commit) = self.graph.get(commitish) {
            return Some(commit);
        }
        self.refs
            .branch(commitish)
            .or_else(|| self.refs.tag(commitish))
            .and_then(|id| self.graph.get(id.as_str()))
    }

    pub fn resolve_id(&self, commitish: &str) -> Option<CommitId> {
        self.resolve(commitish).map(|c| c.id.clone())
    }

    /// true if `name` cannot become a ref of another kind
    fn is_commit_or(&self, name: &str, taken: impl Fn(&RefTable, &str) -> bool) -> bool {
        self.graph.contains(name) || taken(&self.refs, name)
    }

    // ==================== Ref Operations ====================

    /// Bind a tag. No-op (returns `false`) if the name is already a commit id
    /// or a branch, or if `commitish` does not resolve.
    ///
    /// An existing tag of the same name is overwritten.
    pub fn tag(&mut self, name: &TagName, commitish: &str) -> bool {
        if self.is_commit_or(name.as_str(), RefTable::is_branch) {
            return false;
        }
        let Some(target) = self.resolve_id(commitish) else {
            return false;
        };
        tracing::debug!(tag = %name, target = %target.short(), "tag set");
        self.refs.set_tag(name.clone(), target);
        true
    }

    /// (Re)bind a branch. No-op (returns `false`) if the name is already a
    /// commit id or a tag, or if `commitish` does not resolve.
    pub fn branch(&mut self, name: &BranchName, commitish: &str) -> bool {
        if self.is_commit_or(name.as_str(), RefTable::is_tag) {
            return false;
        }
        let Some(target) = self.resolve_id(commitish) else {
            return false;
        };
        tracing::debug!(branch = %name, target = %target.short(), "branch set");
        self.refs.set_branch(name.clone(), target);
        true
    }

    /// `NameCollision` unless `branch` is free to hold a branch
    pub(crate) fn check_branch_name(&self, branch: &BranchName) -> RepoResult<()> {
        if self.is_commit_or(branch.as_str(), RefTable::is_tag) {
            return Err(RepoError::NameCollision(branch.to_string()));
        }
        Ok(())
    }

    // ==================== Commits ====================

    /// Record `world` as the next state of `branch`.
    ///
    /// The delta against the branch head (or the empty world for an unborn
    /// branch) becomes the commit's changes, and the branch advances to it.
    pub fn commit(
        &mut self,
        world: &World,
        branch: &BranchName,
        meta: CommitMeta,
    ) -> RepoResult<&Commit> {
        self.check_branch_name(branch)?;

        let parent = self.refs.branch(branch.as_str()).cloned();
        let prior = self.materialize(parent.as_ref())?;
        let changes = self.differ.diff(&prior, world).ok_or(RepoError::NoChanges)?;

        let depth = self.graph.depth(parent.as_ref());
        let commit = CommitBuilder::new(changes)
            .parent(parent, depth)
            .meta(meta)
            .build(self.clock.as_ref(), self.hasher.as_ref());

        tracing::debug!(
            id = %commit.id.short(),
            branch = %branch,
            depth = commit.depth,
            files = commit.changes.len(),
            "commit recorded"
        );
        self.record(commit, Some(branch))
    }

    /// Insert a freshly minted commit and advance `branch` to it.
    pub(crate) fn record(
        &mut self,
        commit: Commit,
        branch: Option<&BranchName>,
    ) -> RepoResult<&Commit> {
        let id = commit.id.clone();
        let inserted = self.graph.insert_new(commit)?;
        if let Some(branch) = branch {
            self.refs.set_branch(branch.clone(), id);
        }
        Ok(inserted)
    }

    // ==================== Materialization ====================

    /// Rebuild the world at `commitish`.
    pub fn checkout(&self, commitish: &str) -> RepoResult<World> {
        let id = self
            .resolve_id(commitish)
            .ok_or_else(|| RepoError::UnknownCommitish(commitish.to_string()))?;
        self.materialize(Some(&id))
    }

    /// Replay mainline deltas from the root up to `id`; `None` is the empty world.
    pub(crate) fn materialize(&self, id: Option<&CommitId>) -> RepoResult<World> {
        let mut chain = Vec::new();
        let mut cursor = id;
        while let Some(id) = cursor {
            let commit = self
                .graph
                .get(id.as_str())
                .ok_or_else(|| RepoError::UnknownCommitish(id.to_string()))?;
            chain.push(commit);
            cursor = commit.parent.as_ref();
        }

        chain.iter().rev().try_fold(World::new(), |world, commit| {
            self.differ
                .patch(world, &commit.changes)
                .map_err(RepoError::from)
        })
    }

    /// Changes between two commit-ishes, `None` when they hold the same world.
    pub fn diff(&self, from: &str, to: &str) -> RepoResult<Option<Delta>> {
        let old = self.checkout(from)?;
        let new = self.checkout(to)?;
        Ok(self.differ.diff(&old, &new))
    }

    // ==================== History ====================

    /// Ancestor-ordered history of `head`, minus the history of `exclude`.
    pub fn revlist(&self, head: &str, exclude: Option<&str>) -> Vec<CommitId> {
        let Some(head) = self.resolve_id(head) else {
            return Vec::new();
        };
        let exclude = exclude.and_then(|e| self.resolve_id(e));
        traversal::revlist(&self.graph, &head, exclude.as_ref())
    }

    /// Full commits for [`revlist`](Self::revlist).
    pub fn get_revs(&self, head: &str, since: Option<&str>) -> Vec<Commit> {
        self.revlist(head, since)
            .iter()
            .filter_map(|id| self.graph.get(id.as_str()).cloned())
            .collect()
    }

    /// Merge base of the given commit-ishes. `None` if any fails to resolve.
    pub fn concestor(&self, heads: &[&str]) -> Option<CommitId> {
        let ids = heads
            .iter()
            .map(|h| self.resolve_id(h))
            .collect::<Option<Vec<_>>>()?;
        traversal::concestor(&self.graph, &ids)
    }

    /// Commits of `candidate` that would fast-forward `head`, or `None` if
    /// `head` is not part of `candidate`.
    pub fn is_fast_forward(&self, head: &str, candidate: &[CommitId]) -> Option<Vec<CommitId>> {
        let head_id = self.resolve_id(head)?;
        if !candidate.contains(&head_id) {
            return None;
        }
        let local = traversal::revlist(&self.graph, &head_id, None);
        Some(traversal::fast_forward_suffix(&local, candidate))
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("commits", &self.graph.len())
            .field("branches", &self.refs.branches().len())
            .field("tags", &self.refs.tags().len())
            .field("config", &self.config)
            .finish()
    }
}
