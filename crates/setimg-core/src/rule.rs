//! Rewrite rules
//!
//! A [`RewriteRule`] names the image to look for and the components to
//! override. Unset (empty) overrides leave the matching component alone.

use crate::error::ImageParseError;
use crate::image::{split_name, ImageReference};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declarative image override
///
/// Field names follow the `setImageInfo` / config map data shape:
///
/// ```yaml
/// name: nginx
/// newRegistry: gcr.io/proj
/// newTag: 1.21.6
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteRule {
    /// Tag-less image name to match
    #[serde(rename = "name", default, deserialize_with = "scalar_text", skip_serializing_if = "String::is_empty")]
    pub match_name: String,

    /// Replacement repository (may carry its own registry)
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "String::is_empty")]
    pub new_name: String,

    /// Replacement registry
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "String::is_empty")]
    pub new_registry: String,

    /// Replacement tag; drops any digest
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "String::is_empty")]
    pub new_tag: String,
}

/// Outcome of applying a rule to one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Value after the rule (the input when nothing matched)
    pub value: String,
    /// Whether `value` differs from the input
    pub changed: bool,
}

impl RewriteRule {
    /// Rule matching `name` with no overrides yet
    #[inline]
    #[must_use]
    pub fn matching(name: impl Into<String>) -> Self {
        Self {
            match_name: name.into(),
            ..Self::default()
        }
    }

    /// With replacement repository
    #[inline]
    #[must_use]
    pub fn with_new_name(mut self, name: impl Into<String>) -> Self {
        self.new_name = name.into();
        self
    }

    /// With replacement registry
    #[inline]
    #[must_use]
    pub fn with_new_registry(mut self, registry: impl Into<String>) -> Self {
        self.new_registry = registry.into();
        self
    }

    /// With replacement tag
    #[inline]
    #[must_use]
    pub fn with_new_tag(mut self, tag: impl Into<String>) -> Self {
        self.new_tag = tag.into();
        self
    }

    /// A rule without a name never matches anything
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.match_name.is_empty()
    }

    /// Apply the rule to one image string
    ///
    /// # Errors
    /// Returns error if `current` is not an image reference
    pub fn apply(&self, current: &str) -> Result<Rewrite, ImageParseError> {
        let mut image = ImageReference::parse(current)?;
        if !image.matches(&self.match_name) {
            return Ok(Rewrite {
                value: current.to_string(),
                changed: false,
            });
        }

        if !self.new_name.is_empty() {
            let (registry, repository) = split_name(&self.new_name);
            if let Some(registry) = registry {
                image.registry = Some(registry.to_string());
            }
            image.repository = repository.to_string();
        }
        if !self.new_registry.is_empty() {
            image.registry = Some(self.new_registry.clone());
        }
        if !self.new_tag.is_empty() {
            image.tag = Some(self.new_tag.clone());
            image.digest = None;
        }

        let value = image.to_string();
        let changed = value != current;
        Ok(Rewrite { value, changed })
    }
}

/// Read a string-valued field from any YAML scalar
///
/// Rule fields arrive from hand-written YAML where `newTag: 2` or
/// `name: true` are common. Integers and booleans are taken as their text
/// and null as unset. Floating-point scalars are rejected: `1.20` has
/// already become `1.2` by the time it reaches here, so the value must be
/// quoted.
///
/// # Errors
/// Returns error for floats, sequences and mappings
pub fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(ScalarText)
}

struct ScalarText;

impl<'de> Visitor<'de> for ScalarText {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
        Err(E::custom(format_args!(
            "number `{v}` is ambiguous as text, quote the value (for example '1.20')"
        )))
    }

    fn visit_unit<E: de::Error>(self) -> Result<String, E> {
        Ok(String::new())
    }

    fn visit_none<E: de::Error>(self) -> Result<String, E> {
        Ok(String::new())
    }
}
