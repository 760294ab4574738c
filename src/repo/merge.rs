//! Three-way merge of two or more commit-ishes.

use crate::repo::commit::{Commit, CommitBuilder, CommitMeta};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::repository::Repository;
use crate::repo::traversal;
use crate::repo::types::{CommitId, Reference};

impl Repository {
    /// Merge `refs[1..]` into `refs[0]`.
    ///
    /// The base is the concestor of all inputs. Each input is materialized and
    /// handed to the differ as `[mine, base, theirs..]`; overlapping edits are
    /// kept as conflict lines rather than failing the merge. When `refs[0]` is
    /// a branch it advances to the new commit.
    pub fn merge(&mut self, refs: &[&str], meta: CommitMeta) -> RepoResult<&Commit> {
        if refs.len() < 2 {
            return Err(RepoError::NothingToMerge(refs.len()));
        }

        let ids = refs
            .iter()
            .map(|r| {
                self.resolve_id(r)
                    .ok_or_else(|| RepoError::UnknownCommitish(r.to_string()))
            })
            .collect::<RepoResult<Vec<CommitId>>>()?;
        let base = traversal::concestor(&self.graph, &ids);

        let mut worlds = Vec::with_capacity(ids.len() + 1);
        worlds.push(self.materialize(Some(&ids[0]))?);
        worlds.push(self.materialize(base.as_ref())?);
        for id in &ids[1..] {
            worlds.push(self.materialize(Some(id))?);
        }

        let changes = self.differ.diff3(&worlds).ok_or(RepoError::NoChanges)?;
        if changes.has_conflicts() {
            tracing::warn!(
                target_ref = refs[0],
                paths = ?changes.conflicted_paths(),
                "merge recorded conflicts"
            );
        }

        let merged: Vec<CommitId> = ids
            .iter()
            .filter(|id| Some(*id) != base.as_ref())
            .cloned()
            .collect();
        let depth = self.graph.depth(Some(&ids[0]));
        let commit = CommitBuilder::new(changes)
            .parent(Some(ids[0].clone()), depth)
            .merged(merged)
            .meta(meta)
            .build(self.clock.as_ref(), self.hasher.as_ref());

        let target = match self.reference(refs[0]) {
            Some(Reference::Branch(name)) => Some(name),
            _ => None,
        };

        tracing::info!(
            id = %commit.id.short(),
            base = base.as_ref().map(CommitId::short).unwrap_or("-"),
            inputs = ids.len(),
            "merge recorded"
        );
        self.record(commit, target.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use crate::content::{Line, World};
    use crate::repo::clock::ManualClock;
    use crate::repo::commit::CommitMeta;
    use crate::repo::error::RepoError;
    use crate::repo::repository::Repository;
    use crate::repo::types::BranchName;

    fn world(files: Vec<(&str, Vec<&str>)>) -> World {
        files.into_iter().collect()
    }

    fn branch(name: &str) -> BranchName {
        BranchName::new(name).unwrap()
    }

    /// master and feature forked from a shared base
    fn forked(mine: World, theirs: World) -> Repository {
        let mut repo = Repository::new().with_clock(ManualClock::default());
        let base = world(vec![("a.txt", vec!["1", "2", "3", "4", "5"])]);
        repo.commit(&base, &branch("master"), CommitMeta::message("base"))
            .unwrap();
        repo.branch(&branch("feature"), "master");
        repo.commit(&mine, &branch("master"), CommitMeta::new()).unwrap();
        repo.commit(&theirs, &branch("feature"), CommitMeta::new())
            .unwrap();
        repo
    }

    #[test]
    fn test_clean_merge_combines_edits() {
        let mut repo = forked(
            world(vec![("a.txt", vec!["one", "2", "3", "4", "5"])]),
            world(vec![("a.txt", vec!["1", "2", "3", "4", "five"])]),
        );
        let base = repo.concestor(&["master", "feature"]).unwrap();
        let master_head = repo.resolve_id("master").unwrap();
        let feature_head = repo.resolve_id("feature").unwrap();

        let merge = repo
            .merge(&["master", "feature"], CommitMeta::message("merge"))
            .unwrap()
            .clone();

        assert_eq!(merge.parent, Some(master_head.clone()));
        assert_eq!(merge.merged, vec![master_head, feature_head]);
        assert!(!merge.merged.contains(&base));
        assert_eq!(merge.depth, 3);
        assert_eq!(repo.resolve_id("master"), Some(merge.id.clone()));
        assert_eq!(
            repo.checkout("master").unwrap(),
            world(vec![("a.txt", vec!["one", "2", "3", "4", "five"])])
        );
    }

    #[test]
    fn test_conflicting_merge_is_recorded() {
        let mut repo = forked(
            world(vec![("a.txt", vec!["1", "2", "mine", "4", "5"])]),
            world(vec![("a.txt", vec!["1", "2", "theirs", "4", "5"])]),
        );

        let merge = repo
            .merge(&["master", "feature"], CommitMeta::new())
            .unwrap()
            .clone();
        assert!(merge.changes.has_conflicts());

        let merged = repo.checkout("master").unwrap();
        assert_eq!(merged.conflicted_paths(), vec!["a.txt"]);
        let lines = merged.get("a.txt").unwrap();
        assert!(lines.iter().any(Line::is_conflict));
        let text = merged.render("a.txt").unwrap();
        assert!(text.contains("mine"));
        assert!(text.contains("theirs"));
    }

    #[test]
    fn test_merge_needs_two_refs() {
        let mut repo = Repository::new();
        let err = repo.merge(&["master"], CommitMeta::new()).unwrap_err();
        assert!(matches!(err, RepoError::NothingToMerge(1)));
    }

    #[test]
    fn test_merge_unknown_ref_fails() {
        let mut repo = forked(
            world(vec![("a.txt", vec!["x"])]),
            world(vec![("a.txt", vec!["y"])]),
        );
        let before = repo.graph().len();
        let err = repo.merge(&["master", "nope"], CommitMeta::new()).unwrap_err();
        assert!(matches!(err, RepoError::UnknownCommitish(name) if name == "nope"));
        assert_eq!(repo.graph().len(), before);
    }

    #[test]
    fn test_merging_an_ancestor_has_no_changes() {
        let mut repo = Repository::new().with_clock(ManualClock::default());
        let base = repo
            .commit(&world(vec![("a.txt", vec!["1"])]), &branch("master"), CommitMeta::new())
            .unwrap()
            .id
            .clone();
        repo.commit(&world(vec![("a.txt", vec!["1", "2"])]), &branch("master"), CommitMeta::new())
            .unwrap();
        let len = repo.graph().len();
        let head = repo.resolve_id("master");

        let err = repo
            .merge(&["master", base.as_str()], CommitMeta::new())
            .unwrap_err();
        assert!(matches!(err, RepoError::NoChanges));
        assert_eq!(repo.graph().len(), len);
        assert_eq!(repo.resolve_id("master"), head);
    }

    #[test]
    fn test_merge_into_commit_id_moves_no_branch() {
        let mut repo = forked(
            world(vec![("a.txt", vec!["one", "2", "3", "4", "5"])]),
            world(vec![("b.txt", vec!["new"]), ("a.txt", vec!["1", "2", "3", "4", "5"])]),
        );
        let master_head = repo.resolve_id("master").unwrap();
        let feature_head = repo.resolve_id("feature").unwrap();

        let merge = repo
            .merge(&[master_head.as_str(), "feature"], CommitMeta::new())
            .unwrap()
            .id
            .clone();

        assert_eq!(repo.resolve_id("master"), Some(master_head));
        assert_eq!(repo.resolve_id("feature"), Some(feature_head));
        let merged = repo.checkout(merge.as_str()).unwrap();
        assert!(merged.contains("b.txt"));
        assert_eq!(merged.get("a.txt").unwrap()[0], Line::text("one"));
    }
}
