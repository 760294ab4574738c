//! persistence for repositories
//!
//! history is kept as an append-only log of JSON commits, one per line, and
//! the refs as a small JSON snapshot written over on every save. Loading
//! replays the log through [`Repository::restore`](crate::repo::Repository::restore),
//! so a tampered or truncated log is caught by the same checks as any other
//! ingestion.
//!
//! # Usage
//!
//! ```no_run
//! use lineage::content::World;
//! use lineage::repo::{BranchName, CommitMeta, Repository};
//! use lineage::store::Store;
//!
//! let store = Store::open_or_init("./.lineage").unwrap();
//! let mut repo = Repository::new();
//! store.load(&mut repo).unwrap();
//!
//! let mut world = World::new();
//! world.insert_text("notes.txt", "remember the milk");
//! let master = BranchName::new("master").unwrap();
//! repo.commit(&world, &master, CommitMeta::message("notes")).unwrap();
//! store.save(&repo, None).unwrap();
//! ```

mod dir;
mod error;
mod log;
mod snapshot;

pub use dir::Store;
pub use error::{StoreError, StoreResult};
pub use log::{append_commit, read_commit_log, write_commit_log};
pub use snapshot::Snapshot;
