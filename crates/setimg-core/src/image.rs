//! Container image reference grammar
//!
//! `[registry/]repository[:tag][@digest]`
//!
//! The digest is split off at the last `@`; the tag is the text after the
//! last `:` that follows the last `/`, so a registry port (`host:5000/app`)
//! is never mistaken for a tag. The leading path segment is a registry when
//! it contains `.` or `:` or is exactly `localhost`.
//!
//! Formatting is the exact inverse of parsing: `parse(s).to_string() == s`
//! for every non-empty `s`.

use crate::error::ImageParseError;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Parsed container image reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ImageReference {
    /// Registry host (and optional port or path prefix)
    pub registry: Option<String>,
    /// Repository path
    pub repository: String,
    /// Tag without the leading `:`
    pub tag: Option<String>,
    /// Digest without the leading `@`
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parse an image string
    ///
    /// # Errors
    /// Returns [`ImageParseError::Empty`] on empty input; every other string
    /// parses.
    pub fn parse(s: &str) -> Result<Self, ImageParseError> {
        if s.is_empty() {
            return Err(ImageParseError::Empty);
        }

        let (rest, digest) = match s.rfind('@') {
            Some(at) => (&s[..at], Some(s[at + 1..].to_string())),
            None => (s, None),
        };

        let last_slash = rest.rfind('/');
        let (name, tag) = match rest.rfind(':') {
            Some(colon) if last_slash.map_or(true, |slash| colon > slash) => {
                (&rest[..colon], Some(rest[colon + 1..].to_string()))
            }
            _ => (rest, None),
        };

        let (registry, repository) = split_name(name);
        Ok(Self {
            registry: registry.map(str::to_string),
            repository: repository.to_string(),
            tag,
            digest,
        })
    }

    /// Tag-less, digest-less name: `registry/repository` or `repository`
    #[must_use]
    pub fn name(&self) -> String {
        match &self.registry {
            Some(registry) => format!("{registry}/{}", self.repository),
            None => self.repository.clone(),
        }
    }

    /// Check whether `name` identifies this image
    ///
    /// Matches the full tag-less name, or the bare repository when a
    /// registry is present (`docker.io/nginx:1.20` matches `nginx`). An
    /// empty name never matches.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        !name.is_empty() && (self.name() == name || self.repository == name)
    }
}

/// Split a tag-less name into registry and repository
///
/// Only a leading segment followed by `/` can be a registry.
#[must_use]
pub fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once('/') {
        Some((first, rest)) if is_registry(first) => (Some(first), rest),
        _ => (None, name),
    }
}

fn is_registry(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment == "localhost"
}

impl Display for ImageReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(registry) = &self.registry {
            write!(f, "{registry}/")?;
        }
        f.write_str(&self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

impl FromStr for ImageReference {
    type Err = ImageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
