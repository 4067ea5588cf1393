//! Concrete field paths within a resource tree
//!
//! Provides [`FieldPath`] for addressing a single node after every wildcard
//! has been resolved to a concrete key or list position.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// One concrete step from a node to one of its children
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    /// Mapping key
    Key(String),
    /// Sequence position
    Index(usize),
}

/// Path from the document root to a node
///
/// Rendered with keys joined by `.` and list positions as `[i]` suffixes.
/// Keys containing `.`, `[`, `]`, `"` or `\\` (and the empty key) are
/// double-quoted so the rendering parses back to the same steps.
///
/// # Examples
/// - `[Key(spec), Key(containers), Index(0), Key(image)]` → `spec.containers[0].image`
/// - `[Key(metadata), Key(name)]` → `metadata.name`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FieldPath(Vec<Step>);

impl FieldPath {
    /// Create path from steps
    #[inline]
    #[must_use]
    pub fn new(steps: Vec<Step>) -> Self {
        Self(steps)
    }

    /// Empty path (document root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Get path steps
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    /// Get number of steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is the document root
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Get last step (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&Step> {
        self.0.last()
    }

    /// Append a mapping key, returning new path
    #[inline]
    #[must_use]
    pub fn child_key(&self, key: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(Step::Key(key.into()));
        new
    }

    /// Append a sequence position, returning new path
    #[inline]
    #[must_use]
    pub fn child_index(&self, index: usize) -> Self {
        let mut new = self.clone();
        new.0.push(Step::Index(index));
        new
    }

    /// Iterator over steps from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.0.iter()
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for step in &self.0 {
            match step {
                Step::Key(key) => {
                    if !first {
                        f.write_str(".")?;
                    }
                    write_key(f, key)?;
                }
                Step::Index(index) => write!(f, "[{index}]")?,
            }
            first = false;
        }
        Ok(())
    }
}

// Keys that would split or confuse the dotted form are double-quoted, with
// `"` and `\` backslash-escaped: `metadata.annotations."example.com/tag"`.
fn write_key(f: &mut Formatter<'_>, key: &str) -> fmt::Result {
    let plain = !key.is_empty() && !key.chars().any(|c| matches!(c, '.' | '[' | ']' | '"' | '\\'));
    if plain {
        return f.write_str(key);
    }
    f.write_str("\"")?;
    for c in key.chars() {
        if matches!(c, '"' | '\\') {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("\"")
}

impl FromStr for FieldPath {
    type Err = FieldPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let mut steps = Vec::new();
        let mut rest = s;
        loop {
            // One dot-separated segment: an optional key, then `[i]` suffixes.
            let before = steps.len();
            if let Some(quoted) = rest.strip_prefix('"') {
                let (key, tail) =
                    unquote(quoted).ok_or_else(|| FieldPathError::UnterminatedQuote(s.to_string()))?;
                steps.push(Step::Key(key));
                rest = tail;
            } else {
                let end = rest.find(|c: char| c == '.' || c == '[').unwrap_or(rest.len());
                if end > 0 {
                    steps.push(Step::Key(rest[..end].to_string()));
                }
                rest = &rest[end..];
            }

            while let Some(tail) = rest.strip_prefix('[') {
                let close = tail
                    .find(']')
                    .ok_or_else(|| FieldPathError::InvalidIndex(s.to_string()))?;
                let index = tail[..close]
                    .parse::<usize>()
                    .map_err(|_| FieldPathError::InvalidIndex(s.to_string()))?;
                steps.push(Step::Index(index));
                rest = &tail[close + 1..];
            }

            if steps.len() == before {
                return Err(FieldPathError::EmptySegment);
            }
            if rest.is_empty() {
                break;
            }
            rest = rest
                .strip_prefix('.')
                .ok_or_else(|| FieldPathError::UnexpectedText(rest.to_string()))?;
        }

        Ok(Self(steps))
    }
}

// Reads a quoted key up to its closing quote; returns the key and the text after it.
fn unquote(s: &str) -> Option<(String, &str)> {
    let mut key = String::new();
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((key, &s[i + 1..])),
            '\\' => key.push(chars.next()?.1),
            c => key.push(c),
        }
    }
    None
}

impl From<Vec<Step>> for FieldPath {
    fn from(steps: Vec<Step>) -> Self {
        Self(steps)
    }
}

/// Errors related to concrete field paths
#[derive(Debug, thiserror::Error)]
pub enum FieldPathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Malformed list position
    #[error("invalid list position in path: {0}")]
    InvalidIndex(String),

    /// Quoted key without a closing quote
    #[error("unterminated quoted key in path: {0}")]
    UnterminatedQuote(String),

    /// Text after a quoted key or list position that is not `.` or `[`
    #[error("unexpected text in path: {0}")]
    UnexpectedText(String),
}
