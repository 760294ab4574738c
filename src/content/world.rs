//! World state: the full set of file contents at one commit.
//!
//! A world is never stored. It is rebuilt on demand by replaying deltas and
//! thrown away after use.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Marker line opening a rendered conflict.
pub const CONFLICT_START: &str = "<<<<<<<<<<<<<<<<<";
/// Marker line separating two rendered alternatives.
pub const CONFLICT_SEPARATOR: &str = "=================";
/// Marker line closing a rendered conflict.
pub const CONFLICT_END: &str = ">>>>>>>>>>>>>>>>>";

/// A single line of a file.
///
/// Plain lines serialize as JSON strings, conflicts as `{"?": [[..], [..]]}`
/// so the two can never be confused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Line {
    Text(String),
    Conflict(Conflict),
}

/// An unresolved region left behind by a three-way merge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Conflict {
    /// competing line groups, ours first
    #[serde(rename = "?")]
    pub alternatives: Vec<Vec<String>>,
}

impl Conflict {
    pub fn new(alternatives: Vec<Vec<String>>) -> Self {
        Self { alternatives }
    }
}

impl Line {
    pub fn text(s: impl Into<String>) -> Self {
        Line::Text(s.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Line::Conflict(_))
    }

    /// Render this line as plain text lines.
    ///
    /// Conflicts expand into the usual `<<<` / `===` / `>>>` markup.
    pub fn render(&self) -> Vec<String> {
        match self {
            Line::Text(s) => vec![s.clone()],
            Line::Conflict(conflict) => {
                let mut out = vec![CONFLICT_START.to_string()];
                for (i, alt) in conflict.alternatives.iter().enumerate() {
                    if i > 0 {
                        out.push(CONFLICT_SEPARATOR.to_string());
                    }
                    out.extend(alt.iter().cloned());
                }
                out.push(CONFLICT_END.to_string());
                out
            }
        }
    }
}

impl From<&str> for Line {
    fn from(s: &str) -> Self {
        Line::Text(s.to_string())
    }
}

impl From<String> for Line {
    fn from(s: String) -> Self {
        Line::Text(s)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render().join("\n"))
    }
}

/// Flatten a run of lines to plain text, rendering any nested conflicts.
pub(crate) fn render_lines(lines: &[Line]) -> Vec<String> {
    lines.iter().flat_map(Line::render).collect()
}

/// Mapping from file path to its ordered lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct World(BTreeMap<String, Vec<Line>>);

impl World {
    /// the empty world (state before the first commit)
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file given as plain text, split on `\n`.
    pub fn insert_text(&mut self, path: impl Into<String>, text: &str) {
        let lines = text.split('\n').map(Line::from).collect();
        self.0.insert(path.into(), lines);
    }

    pub fn insert(&mut self, path: impl Into<String>, lines: Vec<Line>) -> Option<Vec<Line>> {
        self.0.insert(path.into(), lines)
    }

    pub fn remove(&mut self, path: &str) -> Option<Vec<Line>> {
        self.0.remove(path)
    }

    pub fn get(&self, path: &str) -> Option<&Vec<Line>> {
        self.0.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Line])> {
        self.0.iter().map(|(p, l)| (p.as_str(), l.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Paths whose content still carries unresolved conflicts.
    pub fn conflicted_paths(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(_, lines)| lines.iter().any(Line::is_conflict))
            .map(|(p, _)| p.as_str())
            .collect()
    }

    /// Render one file as text with conflict markup.
    pub fn render(&self, path: &str) -> Option<String> {
        self.0.get(path).map(|lines| render_lines(lines).join("\n"))
    }

    pub(crate) fn files_mut(&mut self) -> &mut BTreeMap<String, Vec<Line>> {
        &mut self.0
    }
}

impl<P, L> FromIterator<(P, Vec<L>)> for World
where
    P: Into<String>,
    L: Into<Line>,
{
    fn from_iter<I: IntoIterator<Item = (P, Vec<L>)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(p, lines)| (p.into(), lines.into_iter().map(Into::into).collect()))
                .collect(),
        )
    }
}
