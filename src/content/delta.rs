//! Deltas: the stored form of a commit's changes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::content::world::Line;

/// A replacement of `remove` old lines starting at `start` with `insert`.
///
/// `start` always indexes the *old* file, hunks are sorted and never overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    pub start: usize,
    pub remove: usize,
    pub insert: Vec<Line>,
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileChange {
    Create(Vec<Line>),
    Delete,
    Edit(Vec<Hunk>),
}

impl FileChange {
    fn inserted(&self) -> Box<dyn Iterator<Item = &Line> + '_> {
        match self {
            FileChange::Create(lines) => Box::new(lines.iter()),
            FileChange::Delete => Box::new(std::iter::empty()),
            FileChange::Edit(hunks) => Box::new(hunks.iter().flat_map(|h| h.insert.iter())),
        }
    }
}

/// Per-file changes between two worlds, keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delta(BTreeMap<String, FileChange>);

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, change: FileChange) {
        self.0.insert(path.into(), change);
    }

    pub fn get(&self, path: &str) -> Option<&FileChange> {
        self.0.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileChange)> {
        self.0.iter().map(|(p, c)| (p.as_str(), c))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// true if applying this delta introduces conflict lines
    pub fn has_conflicts(&self) -> bool {
        self.0.values().any(|c| c.inserted().any(Line::is_conflict))
    }

    /// Paths whose new content includes conflict lines.
    pub fn conflicted_paths(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(_, c)| c.inserted().any(Line::is_conflict))
            .map(|(p, _)| p.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::world::Conflict;

    #[test]
    fn test_delta_json_shape() {
        let mut delta = Delta::new();
        delta.insert("gone.txt", FileChange::Delete);
        delta.insert(
            "a.txt",
            FileChange::Edit(vec![Hunk { start: 1, remove: 0, insert: vec![Line::text("x")] }]),
        );

        let json = serde_json::to_value(&delta).unwrap();
        assert_eq!(json["gone.txt"], serde_json::json!("delete"));
        assert_eq!(json["a.txt"]["edit"][0]["start"], 1);

        let back: Delta = serde_json::from_value(json).unwrap();
        assert_eq!(back, delta);
    }

    #[test]
    fn test_conflict_detection() {
        let mut delta = Delta::new();
        delta.insert("clean.txt", FileChange::Create(vec![Line::text("ok")]));
        assert!(!delta.has_conflicts());

        let conflict = Line::Conflict(Conflict::new(vec![vec!["a".into()], vec!["b".into()]]));
        delta.insert(
            "dirty.txt",
            FileChange::Edit(vec![Hunk { start: 0, remove: 1, insert: vec![conflict] }]),
        );
        assert!(delta.has_conflicts());
        assert_eq!(delta.conflicted_paths(), vec!["dirty.txt"]);
    }
}
