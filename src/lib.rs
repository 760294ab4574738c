//! Lineage - an in-memory, content-addressed version-control engine
//!
//! This crate records snapshots of a set of text files ("worlds") as a DAG of
//! commits whose ids are hashes of their content. On top of the graph it
//! provides branches and tags, ancestor-ordered history, merge-base discovery,
//! three-way merges that keep conflicts inline, and push/pull/clone between
//! repositories.
//!
//! # Example
//!
//! ```
//! use lineage::content::World;
//! use lineage::repo::{BranchName, CommitMeta, PullOutcome, Repository};
//!
//! let master = BranchName::new("master").unwrap();
//!
//! let mut origin = Repository::new();
//! let mut world = World::new();
//! world.insert_text("a.txt", "hello");
//! origin.commit(&world, &master, CommitMeta::message("init")).unwrap();
//!
//! let mut local = Repository::new();
//! local.clone(&origin, &master).unwrap();
//!
//! world.insert_text("a.txt", "hello\nworld");
//! origin.commit(&world, &master, CommitMeta::message("more")).unwrap();
//!
//! let outcome = local.pull(&origin, &master, None).unwrap();
//! assert!(matches!(outcome, PullOutcome::FastForward(_)));
//! assert_eq!(local.checkout("master").unwrap(), world);
//! ```

pub mod content;
pub mod repo;
pub mod store;
