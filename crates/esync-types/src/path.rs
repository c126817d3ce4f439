//! Paths inside a tree.
//!
//! A path is the concatenation of segment names from the root, each prefixed
//! with `/`. The root itself is the empty string, so its direct children are
//! `"/name"`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// Segment separator.
pub const SEPARATOR: char = '/';

/// A validated `/`-separated path from the tree root.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TreePath(String);

impl TreePath {
    /// The root path (`""`).
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Parse a path such as `"/a/b"`. The empty string is the root.
    pub fn parse(raw: &str) -> TypeResult<Self> {
        if raw.is_empty() {
            return Ok(Self::root());
        }
        let rest = raw
            .strip_prefix(SEPARATOR)
            .ok_or_else(|| TypeError::InvalidPath(raw.to_owned()))?;
        if rest.split(SEPARATOR).any(str::is_empty) {
            return Err(TypeError::InvalidPath(raw.to_owned()));
        }
        Ok(Self(raw.to_owned()))
    }

    /// Extend this path by one segment, validating the name.
    pub fn join(&self, name: &str) -> TypeResult<Self> {
        validate_name(name)?;
        Ok(self.child(name))
    }

    /// Extend this path by a segment already known to be valid, such as a
    /// name taken from a [`Tree`](crate::Tree).
    pub fn child(&self, name: &str) -> Self {
        debug_assert!(validate_name(name).is_ok(), "invalid segment {name:?}");
        Self(format!("{}{}{}", self.0, SEPARATOR, name))
    }

    /// Returns `true` for the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let idx = self.0.rfind(SEPARATOR)?;
        Some(Self(self.0[..idx].to_owned()))
    }

    /// The last segment, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        let idx = self.0.rfind(SEPARATOR)?;
        Some(&self.0[idx + 1..])
    }

    /// Segment names from the root down.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR).skip(1)
    }

    /// Number of segments (the root has depth 0).
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Returns `true` if `self` is strictly below `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &TreePath) -> bool {
        self.0.len() > ancestor.0.len()
            && self.0.starts_with(&ancestor.0)
            && self.0[ancestor.0.len()..].starts_with(SEPARATOR)
    }
}

/// Check that `name` can be used as a single path segment.
pub fn validate_name(name: &str) -> TypeResult<()> {
    if name.is_empty() || name.contains(SEPARATOR) {
        return Err(TypeError::InvalidName(name.to_owned()));
    }
    Ok(())
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TreePath {
    type Error = TypeError;

    fn try_from(value: String) -> TypeResult<Self> {
        Self::parse(&value)
    }
}

impl From<TreePath> for String {
    fn from(path: TreePath) -> Self {
        path.0
    }
}

impl AsRef<str> for TreePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
