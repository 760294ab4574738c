//! Content layer: world states, deltas and the differ that moves between them.
//!
//! The repository never looks inside file contents itself. It hands worlds to
//! a [`ContentDiffer`] and stores whatever [`Delta`] comes back.
//!
//! ```text
//!   World ──diff──▶ Delta ──patch──▶ World
//!   [mine, base, theirs..] ──diff3──▶ Delta (may carry conflicts)
//! ```

mod delta;
mod diff;
mod error;
mod world;

pub use delta::{Delta, FileChange, Hunk};
pub use diff::{ContentDiffer, LineDiffer};
pub use error::{PatchError, PatchResult};
pub use world::{Conflict, Line, World, CONFLICT_END, CONFLICT_SEPARATOR, CONFLICT_START};
