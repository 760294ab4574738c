//!  Commit records and how they are minted.
//!
//! a commit is created once, inside `commit` or `merge` (or arrives through
//! ingestion), and is never changed afterwards. Its id is the hash of every
//! other field, so the timestamp makes two otherwise identical commits distinct.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::Delta;
use crate::repo::clock::Clock;
use crate::repo::hash::ContentHasher;
use crate::repo::types::CommitId;

/// An immutable, content-addressed change record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub id: CommitId,
    /// mainline predecessor, `None` for a root commit
    pub parent: Option<CommitId>,
    /// the merge inputs minus the merge base (merge commits only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merged: Vec<CommitId>,
    pub changes: Delta,
    /// mainline depth, root = 1
    pub depth: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, Value>,
}

impl Commit {
    /// check if this is a merge commit
    pub fn is_merge(&self) -> bool {
        !self.merged.is_empty()
    }

    /// every parent link, mainline first
    pub fn parents(&self) -> impl Iterator<Item = &CommitId> {
        self.parent.iter().chain(self.merged.iter())
    }

    /// first line of the message
    pub fn summary(&self) -> &str {
        self.message
            .as_deref()
            .and_then(|m| m.lines().next())
            .unwrap_or("")
    }

    /// The hashed content of this commit (everything but the id).
    pub fn unsigned(&self) -> UnsignedCommit {
        UnsignedCommit {
            parent: self.parent.clone(),
            merged: self.merged.clone(),
            changes: self.changes.clone(),
            depth: self.depth,
            timestamp: self.timestamp,
            message: self.message.clone(),
            meta: self.meta.clone(),
        }
    }
}

/// A commit before its id has been computed.
///
/// Field order and the sorted `meta` map make the serialized form canonical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsignedCommit {
    pub parent: Option<CommitId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merged: Vec<CommitId>,
    pub changes: Delta,
    pub depth: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, Value>,
}

impl UnsignedCommit {
    /// attach the id computed by `hasher`
    pub fn sign(self, hasher: &dyn ContentHasher) -> Commit {
        let id = hasher.hash(&self);
        Commit {
            id,
            parent: self.parent,
            merged: self.merged,
            changes: self.changes,
            depth: self.depth,
            timestamp: self.timestamp,
            message: self.message,
            meta: self.meta,
        }
    }
}

/// Author-supplied metadata carried through unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitMeta {
    pub message: Option<String>,
    pub extra: BTreeMap<String, Value>,
}

impl CommitMeta {
    pub fn new() -> Self {
        Self::default()
    }

    /// metadata with just a message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// add an opaque metadata field (author, email, ...)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// builder for minting commits with a fluent interface
pub struct CommitBuilder {
    parent: Option<CommitId>,
    merged: Vec<CommitId>,
    changes: Delta,
    depth: u64,
    meta: CommitMeta,
}

impl CommitBuilder {
    /// create a new CommitBuilder around a delta
    pub fn new(changes: Delta) -> Self {
        Self {
            parent: None,
            merged: Vec::new(),
            changes,
            depth: 1,
            meta: CommitMeta::default(),
        }
    }

    /// set the mainline parent and its depth
    pub fn parent(mut self, parent: Option<CommitId>, parent_depth: u64) -> Self {
        self.depth = if parent.is_some() { parent_depth + 1 } else { 1 };
        self.parent = parent;
        self
    }

    /// set the extra parents (for merge commits)
    pub fn merged(mut self, merged: Vec<CommitId>) -> Self {
        self.merged = merged;
        self
    }

    /// set the message and metadata
    pub fn meta(mut self, meta: CommitMeta) -> Self {
        self.meta = meta;
        self
    }

    /// stamp the time and compute the id
    pub fn build(self, clock: &dyn Clock, hasher: &dyn ContentHasher) -> Commit {
        UnsignedCommit {
            parent: self.parent,
            merged: self.merged,
            changes: self.changes,
            depth: self.depth,
            timestamp: clock.now(),
            message: self.meta.message,
            meta: self.meta.extra,
        }
        .sign(hasher)
    }
}
