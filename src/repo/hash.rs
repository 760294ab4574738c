//! Commit identity.

use sha2::{Digest, Sha256};

use crate::repo::commit::UnsignedCommit;
use crate::repo::types::CommitId;

/// Deterministic hash over a commit's content.
///
/// Implementations must not depend on map insertion order.
pub trait ContentHasher: Send + Sync {
    fn hash(&self, commit: &UnsignedCommit) -> CommitId;
}

/// SHA-256 over the canonical JSON form, hex encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl ContentHasher for Sha256Hasher {
    fn hash(&self, commit: &UnsignedCommit) -> CommitId {
        // all keys are strings and all maps are sorted, so this cannot fail
        let canonical = serde_json::to_vec(commit).expect("commit content serializes to JSON");

        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        CommitId::new(hex::encode(hasher.finalize()))
    }
}
