//! The commit log: one JSON commit per line, append-only.
//!
//! Commits are appended as they are created, so the log is always in an order
//! where parents precede children and can be fed straight to
//! [`Repository::add_commits`](crate::repo::Repository::add_commits).

use std::io::{BufRead, Write};

use crate::repo::Commit;
use crate::store::error::{StoreError, StoreResult};

/// Read every commit from a log. Blank lines are ignored.
pub fn read_commit_log<R: BufRead>(reader: R) -> StoreResult<Vec<Commit>> {
    let mut commits = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let commit = serde_json::from_str(&line)
            .map_err(|source| StoreError::Json { line: i + 1, source })?;
        commits.push(commit);
    }
    Ok(commits)
}

/// Append one commit as a single line.
pub fn append_commit<W: Write>(mut writer: W, commit: &Commit) -> StoreResult<()> {
    let line = serde_json::to_string(commit)?;
    writeln!(writer, "{line}")?;
    Ok(())
}

/// Write a whole log.
pub fn write_commit_log<'a, W, I>(mut writer: W, commits: I) -> StoreResult<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Commit>,
{
    for commit in commits {
        append_commit(&mut writer, commit)?;
    }
    writer.flush()?;
    Ok(())
}
