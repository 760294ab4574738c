//! Line-level diff, patch and three-way merge.
//!
//! [`ContentDiffer`] is the capability the repository calls into. [`LineDiffer`]
//! is the built-in implementation: an LCS line diff per file and a diff3-style
//! merge that records overlapping edits as [`Line::Conflict`] values.

use std::collections::BTreeSet;

use crate::content::delta::{Delta, FileChange, Hunk};
use crate::content::error::{PatchError, PatchResult};
use crate::content::world::{render_lines, Conflict, Line, World};

/// Two- and three-way diffing over worlds.
pub trait ContentDiffer: Send + Sync {
    /// Changes turning `from` into `to`, or `None` when they are equal.
    fn diff(&self, from: &World, to: &World) -> Option<Delta>;

    /// Merge `[mine, base, theirs, ..]` and return the delta to apply on top
    /// of `mine`. `None` when the merge leaves `mine` unchanged.
    fn diff3(&self, worlds: &[World]) -> Option<Delta>;

    /// Apply `delta` to `world`. Must satisfy `patch(a, diff(a, b)) == b`.
    fn patch(&self, world: World, delta: &Delta) -> PatchResult<World>;
}

/// LCS-based line differ.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineDiffer;

impl ContentDiffer for LineDiffer {
    fn diff(&self, from: &World, to: &World) -> Option<Delta> {
        let mut delta = Delta::new();
        let paths: BTreeSet<&str> = from.paths().chain(to.paths()).collect();

        for path in paths {
            match (from.get(path), to.get(path)) {
                (Some(old), Some(new)) if old != new => {
                    delta.insert(path, FileChange::Edit(line_hunks(old, new)));
                }
                (None, Some(new)) => delta.insert(path, FileChange::Create(new.clone())),
                (Some(_), None) => delta.insert(path, FileChange::Delete),
                _ => {}
            }
        }

        (!delta.is_empty()).then_some(delta)
    }

    fn diff3(&self, worlds: &[World]) -> Option<Delta> {
        let (mine, rest) = worlds.split_first()?;
        let (base, others) = rest.split_first()?;

        let mut merged = mine.clone();
        for theirs in others {
            merged = merge_worlds(&merged, base, theirs);
        }

        self.diff(mine, &merged)
    }

    fn patch(&self, mut world: World, delta: &Delta) -> PatchResult<World> {
        let files = world.files_mut();

        for (path, change) in delta.iter() {
            match change {
                FileChange::Create(lines) => {
                    if files.contains_key(path) {
                        return Err(PatchError::FileExists(path.to_string()));
                    }
                    files.insert(path.to_string(), lines.clone());
                }
                FileChange::Delete => {
                    files
                        .remove(path)
                        .ok_or_else(|| PatchError::MissingFile(path.to_string()))?;
                }
                FileChange::Edit(hunks) => {
                    let lines = files
                        .get_mut(path)
                        .ok_or_else(|| PatchError::MissingFile(path.to_string()))?;
                    *lines = apply_hunks(path, lines, hunks)?;
                }
            }
        }

        Ok(world)
    }
}

fn apply_hunks(path: &str, old: &[Line], hunks: &[Hunk]) -> PatchResult<Vec<Line>> {
    let mut out = Vec::with_capacity(old.len());
    let mut cursor = 0;

    for hunk in hunks {
        let end = hunk.start.checked_add(hunk.remove).filter(|&e| e <= old.len());
        let Some(end) = end.filter(|_| hunk.start >= cursor) else {
            return Err(PatchError::HunkOutOfRange {
                path: path.to_string(),
                start: hunk.start,
                end: hunk.start.saturating_add(hunk.remove),
                len: old.len(),
            });
        };
        out.extend_from_slice(&old[cursor..hunk.start]);
        out.extend(hunk.insert.iter().cloned());
        cursor = end;
    }

    out.extend_from_slice(&old[cursor..]);
    Ok(out)
}

/// Largest LCS table built for the differing middle of a file. Beyond this
/// the middle is replaced as a whole.
const MAX_LCS_CELLS: usize = 4_000_000;

/// Index pairs `(i, j)` with `a[i] == b[j]` forming a longest common subsequence.
///
/// Only the common prefix and suffix are matched when the middles are too
/// large to align (see [`MAX_LCS_CELLS`]).
fn lcs_matches(a: &[Line], b: &[Line]) -> Vec<(usize, usize)> {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let a_mid = &a[prefix..a.len() - suffix];
    let b_mid = &b[prefix..b.len() - suffix];
    let (n, m) = (a_mid.len(), b_mid.len());

    let mut matches: Vec<(usize, usize)> = (0..prefix).map(|i| (i, i)).collect();
    let (a_tail, b_tail) = (a.len() - suffix, b.len() - suffix);
    let cells = (n + 1).checked_mul(m + 1);
    if cells.map_or(true, |cells| cells > MAX_LCS_CELLS) {
        tracing::debug!(old = n, new = m, "file too large to align, replacing middle");
        matches.extend((0..suffix).map(|k| (a_tail + k, b_tail + k)));
        return matches;
    }

    // table[i * width + j] = LCS length of a_mid[i..] and b_mid[j..]
    let width = m + 1;
    let mut table = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i * width + j] = if a_mid[i] == b_mid[j] {
                table[(i + 1) * width + j + 1] + 1
            } else {
                table[(i + 1) * width + j].max(table[i * width + j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a_mid[i] == b_mid[j] {
            matches.push((prefix + i, prefix + j));
            i += 1;
            j += 1;
        } else if table[(i + 1) * width + j] >= table[i * width + j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }

    matches.extend((0..suffix).map(|k| (a_tail + k, b_tail + k)));
    matches
}

fn line_hunks(old: &[Line], new: &[Line]) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let (mut i, mut j) = (0, 0);

    let sentinel = std::iter::once((old.len(), new.len()));
    for (mi, mj) in lcs_matches(old, new).into_iter().chain(sentinel) {
        if mi > i || mj > j {
            hunks.push(Hunk {
                start: i,
                remove: mi - i,
                insert: new[j..mj].to_vec(),
            });
        }
        i = mi + 1;
        j = mj + 1;
    }

    hunks
}

/// For each base line, the index of the line it is matched with in `other`.
fn base_index(base_len: usize, matches: Vec<(usize, usize)>) -> Vec<Option<usize>> {
    let mut at = vec![None; base_len];
    for (b, o) in matches {
        at[b] = Some(o);
    }
    at
}

fn merge_lines(mine: &[Line], base: &[Line], theirs: &[Line]) -> Vec<Line> {
    let mine_at = base_index(base.len(), lcs_matches(base, mine));
    let theirs_at = base_index(base.len(), lcs_matches(base, theirs));

    let mut out = Vec::with_capacity(mine.len().max(theirs.len()));
    let (mut b, mut m, mut t) = (0, 0, 0);

    loop {
        // stable run: all three agree
        while b < base.len() && mine_at[b] == Some(m) && theirs_at[b] == Some(t) {
            out.push(base[b].clone());
            b += 1;
            m += 1;
            t += 1;
        }

        if b == base.len() && m == mine.len() && t == theirs.len() {
            break;
        }

        let (nb, nm, nt) = (b..base.len())
            .find_map(|k| match (mine_at[k], theirs_at[k]) {
                (Some(mk), Some(tk)) => Some((k, mk, tk)),
                _ => None,
            })
            .unwrap_or((base.len(), mine.len(), theirs.len()));

        resolve_chunk(&mut out, &mine[m..nm], &base[b..nb], &theirs[t..nt]);
        b = nb;
        m = nm;
        t = nt;
    }

    out
}

fn resolve_chunk(out: &mut Vec<Line>, mine: &[Line], base: &[Line], theirs: &[Line]) {
    if mine == base {
        out.extend_from_slice(theirs);
    } else if theirs == base || mine == theirs {
        out.extend_from_slice(mine);
    } else {
        out.push(Line::Conflict(Conflict::new(vec![
            render_lines(mine),
            render_lines(theirs),
        ])));
    }
}

fn merge_file(
    mine: Option<&Vec<Line>>,
    base: Option<&Vec<Line>>,
    theirs: Option<&Vec<Line>>,
) -> Option<Vec<Line>> {
    if mine == theirs || theirs == base {
        return mine.cloned();
    }
    if mine == base {
        return theirs.cloned();
    }

    match (mine, theirs) {
        (Some(m), Some(t)) => {
            let empty = Vec::new();
            Some(merge_lines(m, base.unwrap_or(&empty), t))
        }
        // deleted on one side, modified on the other
        (m, t) => {
            let side = |lines: Option<&Vec<Line>>| lines.map(|l| render_lines(l)).unwrap_or_default();
            Some(vec![Line::Conflict(Conflict::new(vec![side(m), side(t)]))])
        }
    }
}

fn merge_worlds(mine: &World, base: &World, theirs: &World) -> World {
    let paths: BTreeSet<&str> = mine
        .paths()
        .chain(base.paths())
        .chain(theirs.paths())
        .collect();

    let mut merged = World::new();
    for path in paths {
        if let Some(lines) = merge_file(mine.get(path), base.get(path), theirs.get(path)) {
            merged.insert(path, lines);
        }
    }
    merged
}
