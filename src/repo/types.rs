//! core type-safe wrappers for commit ids and ref names.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Content hash identifying a commit.
///
/// Ids are minted by the configured hasher, so no format is enforced here;
/// the default hasher produces lowercase hex SHA-256.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// short form of the commit ID
    pub fn short(&self) -> &str {
        self.0.get(..7).unwrap_or(&self.0)
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CommitId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// check the rules shared by branch and tag names
fn validate_ref_name(name: &str) -> Result<(), InvalidNameError> {
    if name.is_empty() {
        return Err(InvalidNameError::Empty);
    }

    if name.len() > 255 {
        return Err(InvalidNameError::TooLong(name.len()));
    }

    if let Some(first) = name.chars().next() {
        if first == '-' {
            return Err(InvalidNameError::InvalidStart(first));
        }
    }

    for (i, c) in name.chars().enumerate() {
        if c.is_whitespace() || c.is_control() {
            return Err(InvalidNameError::InvalidCharacter { char: c, position: i });
        }
    }

    if name.contains("..") || name.ends_with('/') {
        return Err(InvalidNameError::InvalidPath(name.to_string()));
    }

    Ok(())
}

/// A mutable named pointer to a commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// the branch used when nothing else is configured
    pub const DEFAULT: &'static str = "master";

    /// create a new BranchName
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidNameError> {
        let name = name.into();
        validate_ref_name(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BranchName {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl TryFrom<String> for BranchName {
    type Error = InvalidNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for BranchName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A name bound once to a commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagName(String);

impl TagName {
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidNameError> {
        let name = name.into();
        validate_ref_name(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TagName {
    type Error = InvalidNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TagName> for String {
    fn from(name: TagName) -> Self {
        name.0
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for TagName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// What a commit-ish string turned out to name.
///
/// Commit ids, branches and tags share one namespace and are checked in that
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    Commit(CommitId),
    Branch(BranchName),
    Tag(TagName),
}

impl Reference {
    pub fn as_str(&self) -> &str {
        match self {
            Reference::Commit(id) => id.as_str(),
            Reference::Branch(name) => name.as_str(),
            Reference::Tag(name) => name.as_str(),
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Reference::Branch(_))
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Commit(id) => write!(f, "commit {}", id.short()),
            Reference::Branch(name) => write!(f, "branch {name}"),
            Reference::Tag(name) => write!(f, "tag {name}"),
        }
    }
}

/// error type for invalid branch and tag names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidNameError {
    Empty,
    TooLong(usize),
    InvalidStart(char),
    InvalidCharacter { char: char, position: usize },
    InvalidPath(String),
}

impl fmt::Display for InvalidNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "name cannot be empty"),
            Self::TooLong(len) => write!(f, "name too long: {} characters", len),
            Self::InvalidStart(c) => write!(f, "name cannot start with '{}'", c),
            Self::InvalidCharacter { char, position } => {
                write!(f, "invalid character {:?} at position {}", char, position)
            }
            Self::InvalidPath(path) => write!(f, "invalid path: '{}'", path),
        }
    }
}

impl std::error::Error for InvalidNameError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_name_valid() {
        assert!(BranchName::new("master").is_ok());
        assert!(BranchName::new("feature/login").is_ok());
        assert!(BranchName::new("fix-123").is_ok());
        assert!(BranchName::new("v1.0").is_ok());
    }

    #[test]
    fn test_branch_name_invalid() {
        assert_eq!(BranchName::new(""), Err(InvalidNameError::Empty));
        assert!(BranchName::new("-flag").is_err());
        assert!(BranchName::new("has space").is_err());
        assert!(BranchName::new("a..b").is_err());
        assert!(BranchName::new("trailing/").is_err());
        assert!(BranchName::new("x".repeat(256)).is_err());
    }

    #[test]
    fn test_tag_name_shares_rules() {
        assert!(TagName::new("v1.0.0").is_ok());
        assert!(TagName::new("bad\ttag").is_err());
    }

    #[test]
    fn test_branch_name_serde_validates() {
        let name: BranchName = serde_json::from_str("\"feature\"").unwrap();
        assert_eq!(name.as_str(), "feature");
        assert!(serde_json::from_str::<BranchName>("\"a b\"").is_err());
    }

    #[test]
    fn test_commit_id_short() {
        let id = CommitId::new("0123456789abcdef");
        assert_eq!(id.short(), "0123456");
        assert_eq!(CommitId::new("abc").short(), "abc");
    }

    #[test]
    fn test_default_branch() {
        assert_eq!(BranchName::default().as_str(), BranchName::DEFAULT);
    }
}
