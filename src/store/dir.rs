//! On-disk layout: a directory holding `commits` (the log) and `state`
//! (the snapshot).

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::repo::{Commit, CommitId, Repository};
use crate::store::error::{StoreError, StoreResult};
use crate::store::log::{append_commit, read_commit_log, write_commit_log};
use crate::store::snapshot::Snapshot;

const COMMITS_FILE: &str = "commits";
const STATE_FILE: &str = "state";

/// A repository persisted to a directory.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Open an existing store.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let root = path.as_ref().to_path_buf();
        if !root.join(STATE_FILE).is_file() {
            return Err(StoreError::NotInitialized(root));
        }
        Ok(Self { root })
    }

    /// Initialize a new, empty store.
    pub fn init(path: impl AsRef<Path>) -> StoreResult<Self> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        File::create(root.join(COMMITS_FILE))?;

        let store = Self { root };
        store.write_state(&Snapshot::default())?;
        tracing::debug!(path = %store.root.display(), "store initialized");
        Ok(store)
    }

    /// Open or initialize a store.
    pub fn open_or_init(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if path.join(STATE_FILE).is_file() {
            Self::open(path)
        } else {
            Self::init(path)
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Read history and refs into `repo` and return the snapshot.
    pub fn load(&self, repo: &mut Repository) -> StoreResult<Snapshot> {
        let commits = self.read_log()?;
        let snapshot = Snapshot::from_reader(BufReader::new(File::open(
            self.root.join(STATE_FILE),
        )?))?;

        repo.restore(commits, &snapshot)?;
        Ok(snapshot)
    }

    /// Append a new commit to the log.
    pub fn append(&self, commit: &Commit) -> StoreResult<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(COMMITS_FILE))?;
        let mut writer = BufWriter::new(file);
        append_commit(&mut writer, commit)?;
        writer.flush()?;
        Ok(())
    }

    /// Persist `repo`: append every commit reachable from a branch or tag
    /// that the log does not hold yet, then write the refs.
    ///
    /// Commits are appended parents first, so history ingested by a clone or
    /// pull is saved along with local commits. Returns how many were appended.
    pub fn save(&self, repo: &Repository, current: Option<&str>) -> StoreResult<usize> {
        let mut logged: HashSet<CommitId> = self.read_log()?.into_iter().map(|c| c.id).collect();

        let refs = repo.refs();
        let heads = refs.branches().values().chain(refs.tags().values());
        let mut pending = Vec::new();
        for head in heads {
            for id in repo.revlist(head.as_str(), None) {
                if logged.insert(id.clone()) {
                    pending.extend(repo.resolve(id.as_str()).cloned());
                }
            }
        }

        if !pending.is_empty() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.root.join(COMMITS_FILE))?;
            write_commit_log(BufWriter::new(file), &pending)?;
        }
        self.write_state(&repo.snapshot(current))?;
        tracing::debug!(appended = pending.len(), "store saved");
        Ok(pending.len())
    }

    fn read_log(&self) -> StoreResult<Vec<Commit>> {
        match File::open(self.root.join(COMMITS_FILE)) {
            Ok(file) => read_commit_log(BufReader::new(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_state(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let mut writer = BufWriter::new(File::create(self.root.join(STATE_FILE))?);
        snapshot.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::content::World;
    use crate::repo::{BranchName, CommitMeta, ManualClock, TagName};

    fn setup() -> (TempDir, Store) {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::init(temp_dir.path().join("repo")).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_open_uninitialized_fails() {
        let temp_dir = TempDir::new().unwrap();
        let err = Store::open(temp_dir.path()).unwrap_err();
        assert!(matches!(err, StoreError::NotInitialized(_)));
    }

    #[test]
    fn test_open_or_init() {
        let (temp_dir, store) = setup();
        let again = Store::open_or_init(temp_dir.path().join("repo")).unwrap();
        assert_eq!(again.path(), store.path());

        let mut repo = Repository::new();
        let snapshot = again.load(&mut repo).unwrap();
        assert!(repo.is_empty());
        assert!(snapshot.branches.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let (_temp_dir, store) = setup();
        let master = BranchName::new("master").unwrap();
        let mut repo = Repository::new().with_clock(ManualClock::default());

        let v1: World = vec![("a.txt", vec!["hello"])].into_iter().collect();
        let c1 = repo.commit(&v1, &master, CommitMeta::message("one")).unwrap().clone();
        assert_eq!(store.save(&repo, None).unwrap(), 1);

        let v2: World = vec![("a.txt", vec!["hello", "world"])].into_iter().collect();
        let c2 = repo.commit(&v2, &master, CommitMeta::message("two")).unwrap().clone();
        repo.tag(&TagName::new("v2").unwrap(), "master");
        assert_eq!(store.save(&repo, Some("v2")).unwrap(), 1);
        assert_eq!(store.save(&repo, Some("v2")).unwrap(), 0);

        let mut loaded = Repository::new();
        let snapshot = store.load(&mut loaded).unwrap();
        assert_eq!(snapshot.current, "v2");
        assert_eq!(loaded.graph().len(), 2);
        assert_eq!(loaded.resolve_id("master"), Some(c2.id.clone()));
        assert_eq!(loaded.resolve_id("v2"), Some(c2.id));
        assert_eq!(loaded.checkout(c1.id.as_str()).unwrap(), v1);
        assert_eq!(loaded.checkout("master").unwrap(), v2);
    }

    #[test]
    fn test_save_after_clone_keeps_remote_history() {
        let (_temp_dir, store) = setup();
        let master = BranchName::new("master").unwrap();
        let feature = BranchName::new("feature").unwrap();

        let mut origin = Repository::new().with_clock(ManualClock::default());
        let v1: World = vec![("a.txt", vec!["one"])].into_iter().collect();
        let v2: World = vec![("a.txt", vec!["one", "two"])].into_iter().collect();
        origin.commit(&v1, &master, CommitMeta::new()).unwrap();
        origin.commit(&v2, &master, CommitMeta::new()).unwrap();

        let mut local = Repository::new().with_clock(ManualClock::new(0, 1));
        local.clone(&origin, &master).unwrap();
        local.branch(&feature, "master");
        let v3: World = vec![("a.txt", vec!["one", "two", "three"])].into_iter().collect();
        local.commit(&v3, &feature, CommitMeta::new()).unwrap();

        assert_eq!(store.save(&local, None).unwrap(), 3);

        let mut loaded = Repository::new();
        store.load(&mut loaded).unwrap();
        assert_eq!(loaded.graph().len(), 3);
        assert_eq!(loaded.resolve_id("master"), origin.resolve_id("master"));
        assert_eq!(loaded.checkout("master").unwrap(), v2);
        assert_eq!(loaded.checkout("feature").unwrap(), v3);
    }

    #[test]
    fn test_corrupt_log_is_reported() {
        let (_temp_dir, store) = setup();
        fs::write(store.path().join(COMMITS_FILE), "garbage\n").unwrap();

        let mut repo = Repository::new();
        let err = store.load(&mut repo).unwrap_err();
        assert!(err.is_corrupt());
        assert!(repo.is_empty());
    }
}
