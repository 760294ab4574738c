//! the repository engine
//!
//! this module owns commit history: the commit graph, branches and tags,
//! traversal, materialization, merging and replication. It never looks inside
//! file contents itself; all line-level work goes through a
//! [`ContentDiffer`](crate::content::ContentDiffer).
//!
//!  # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Repository                           │
//! │   (commit, checkout, merge, tag/branch, clone/push/pull)    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │    graph    │       │  traversal  │       │    refs     │
//!  │  (commits)  │       │ (revlists)  │       │ (branches)  │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//!         │                     │                     │
//!         └─────────────────────┼─────────────────────┘
//!                               │
//!                               ▼
//!                        ┌─────────────┐
//!                        │   commit    │
//!                        │  (records)  │
//!                        └─────────────┘
//!  ```
//!
//! # Usage
//!
//! ```
//! use lineage::content::World;
//! use lineage::repo::{BranchName, CommitMeta, Repository};
//!
//! let mut repo = Repository::new();
//! let master = BranchName::new("master")?;
//!
//! let mut world = World::new();
//! world.insert_text("README", "hello");
//! let first = repo.commit(&world, &master, CommitMeta::message("init"))?.id.clone();
//!
//! world.insert_text("README", "hello\nworld");
//! repo.commit(&world, &master, CommitMeta::message("more"))?;
//!
//! assert_eq!(repo.revlist("master", None).len(), 2);
//! assert_eq!(repo.checkout(first.as_str())?.render("README").as_deref(), Some("hello"));
//! # Ok::<(), lineage::repo::RepoError>(())
//! ```

mod clock;
mod commit;
mod config;
mod error;
mod graph;
mod hash;
mod merge;
mod refs;
mod repository;
mod shared;
mod sync;
mod traversal;
mod types;

// Re-export public API
pub use clock::{Clock, ManualClock, SystemClock};
pub use commit::{Commit, CommitBuilder, CommitMeta, UnsignedCommit};
pub use config::RepositoryConfig;
pub use error::{RepoError, RepoResult};
pub use graph::CommitGraph;
pub use hash::{ContentHasher, Sha256Hasher};
pub use refs::RefTable;
pub use repository::Repository;
pub use shared::SharedRepository;
pub use sync::{PullOutcome, Remote};
pub use traversal::{concestor, fast_forward_suffix, revlist};
pub use types::{BranchName, CommitId, InvalidNameError, Reference, TagName};
