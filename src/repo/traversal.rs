//! History traversal: ancestor-ordered revision lists and merge bases.
//!
//! Everything here walks the graph with an explicit stack so deep histories
//! cannot overflow the call stack.

use std::collections::{HashMap, HashSet};

use crate::repo::graph::CommitGraph;
use crate::repo::types::CommitId;

enum Visit<'a> {
    Enter(&'a CommitId),
    Exit(&'a CommitId),
}

/// Ancestors of `head` (inclusive), each listed after all of its parents.
///
/// Parents are visited mainline first, then `merged` in order. When
/// `exclude` is given, its own history is left out ("history of `head` not in
/// `exclude`"). An unknown head yields an empty list.
pub fn revlist(graph: &CommitGraph, head: &CommitId, exclude: Option<&CommitId>) -> Vec<CommitId> {
    let skip: HashSet<CommitId> = match exclude {
        Some(ex) => walk(graph, ex, &HashSet::new()).into_iter().collect(),
        None => HashSet::new(),
    };
    walk(graph, head, &skip)
}

fn walk<'a>(graph: &'a CommitGraph, head: &'a CommitId, skip: &HashSet<CommitId>) -> Vec<CommitId> {
    let mut out = Vec::new();
    let mut done: HashSet<&CommitId> = HashSet::new();
    let mut stack = vec![Visit::Enter(head)];

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(id) => {
                // skip is ancestor-closed, so stopping here is a set difference
                if done.contains(id) || skip.contains(id) {
                    continue;
                }
                let Some(commit) = graph.get(id.as_str()) else {
                    continue;
                };
                stack.push(Visit::Exit(id));
                let parents: Vec<&CommitId> = commit.parents().collect();
                stack.extend(parents.into_iter().rev().map(Visit::Enter));
            }
            Visit::Exit(id) => {
                if done.insert(id) {
                    out.push(id.clone());
                }
            }
        }
    }

    out
}

/// Approximate merge base of two or more heads.
///
/// The first head's revlist is the reference chain. Each further head walks
/// back along mainline parents until it meets the chain at or before the
/// current cutoff, which then moves there. The id at the final cutoff is the
/// concestor.
///
/// This follows a single path per head, so on tangled histories it can pick
/// an ancestor that is not the lowest common one. Returns `None` for fewer
/// than two heads or when some head never meets the chain.
pub fn concestor(graph: &CommitGraph, heads: &[CommitId]) -> Option<CommitId> {
    let (first, rest) = heads.split_first()?;
    if rest.is_empty() {
        return None;
    }

    let chain = revlist(graph, first, None);
    let index: HashMap<&CommitId, usize> = chain.iter().enumerate().map(|(i, id)| (id, i)).collect();

    let mut cutoff: Option<usize> = None;
    for head in rest {
        let mut cursor = Some(head);
        let mut hit = None;
        while let Some(id) = cursor {
            if let Some(&i) = index.get(id) {
                if cutoff.map_or(true, |c| i <= c) {
                    hit = Some(i);
                    break;
                }
            }
            cursor = graph.get(id.as_str()).and_then(|c| c.parent.as_ref());
        }
        cutoff = Some(hit?);
    }

    cutoff.map(|i| chain[i].clone())
}

/// The part of `candidate` past its common prefix with `local`.
///
/// Both lists are ancestor-ordered revlists; the comparison is positional.
pub fn fast_forward_suffix(local: &[CommitId], candidate: &[CommitId]) -> Vec<CommitId> {
    let shared = local
        .iter()
        .zip(candidate)
        .take_while(|(a, b)| a == b)
        .count();
    candidate[shared..].to_vec()
}
