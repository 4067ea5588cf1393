//! Declarative field specifications
//!
//! A [`FieldSpec`] pairs a group/version/kind selector with a `/`-separated
//! path pattern. Patterns understand three segment forms:
//!
//! - `name` descends into the mapping key `name` (`\/` escapes a slash)
//! - `name[]` descends into `name`, then fans out over every list element
//! - `*` fans out over every value of the current mapping
//!
//! Specs are compiled into a [`FieldSelector`] once per pass, so malformed
//! paths are reported before any document is touched.

use serde::{Deserialize, Serialize};

/// Group/version/kind selector
///
/// Empty fields match anything, so the default selector matches every
/// resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gvk {
    /// API group (empty for the core group)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,

    /// API version
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// Resource kind
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

impl Gvk {
    /// Selector matching a single kind in any group or version
    #[inline]
    #[must_use]
    pub fn kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Check whether this selector matches a resource's `apiVersion` and `kind`
    #[must_use]
    pub fn selects(&self, api_version: &str, kind: &str) -> bool {
        let (group, version) = split_api_version(api_version);
        (self.group.is_empty() || self.group == group)
            && (self.version.is_empty() || self.version == version)
            && (self.kind.is_empty() || self.kind == kind)
    }

    /// Check if selector matches everything
    #[inline]
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.group.is_empty() && self.version.is_empty() && self.kind.is_empty()
    }
}

/// Split `group/version` into its parts; a bare version belongs to the core group
#[must_use]
pub fn split_api_version(api_version: &str) -> (&str, &str) {
    match api_version.rsplit_once('/') {
        Some((group, version)) => (group, version),
        None => ("", api_version),
    }
}

/// Where an image reference may live in a resource
///
/// Serialized in the same shape as kustomize field specs:
///
/// ```yaml
/// - path: spec/template/spec/containers[]/image
///   kind: Deployment
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Resource selector
    #[serde(flatten)]
    pub gvk: Gvk,

    /// Path pattern
    pub path: String,

    /// Accepted for catalog compatibility; missing fields are never created
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub create: bool,
}

impl FieldSpec {
    /// Spec applying to every resource
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            gvk: Gvk::default(),
            path: path.into(),
            create: false,
        }
    }

    /// Restrict spec to one kind
    #[inline]
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.gvk.kind = kind.into();
        self
    }

    /// Restrict spec to one group
    #[inline]
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.gvk.group = group.into();
        self
    }

    /// Restrict spec to one version
    #[inline]
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.gvk.version = version.into();
        self
    }

    /// Parse the path pattern
    ///
    /// # Errors
    /// Returns error if the path is empty, has an empty segment, or ends in
    /// a dangling escape
    pub fn compile(&self) -> Result<FieldSelector, FieldSpecError> {
        Ok(FieldSelector {
            gvk: self.gvk.clone(),
            pattern: parse_pattern(&self.path)?,
            source: self.path.clone(),
        })
    }
}

/// One segment of a compiled path pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Descend into a mapping key
    Key(String),
    /// Fan out over every element of a sequence
    AnyElement,
    /// Fan out over every value of a mapping
    AnyValue,
}

/// Compiled [`FieldSpec`], ready for resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSelector {
    gvk: Gvk,
    pattern: Vec<PathSegment>,
    source: String,
}

impl FieldSelector {
    /// Resource selector
    #[inline]
    #[must_use]
    pub fn gvk(&self) -> &Gvk {
        &self.gvk
    }

    /// Compiled segments
    #[inline]
    #[must_use]
    pub fn pattern(&self) -> &[PathSegment] {
        &self.pattern
    }

    /// Pattern as written in the spec
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

fn parse_pattern(path: &str) -> Result<Vec<PathSegment>, FieldSpecError> {
    if path.is_empty() {
        return Err(FieldSpecError::EmptyPath);
    }

    let mut raw = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('/') => current.push('/'),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => return Err(FieldSpecError::DanglingEscape(path.to_string())),
            },
            '/' => raw.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    raw.push(current);

    let mut segments = Vec::with_capacity(raw.len());
    for seg in raw {
        if seg.is_empty() {
            return Err(FieldSpecError::EmptySegment(path.to_string()));
        }
        if seg == "*" {
            segments.push(PathSegment::AnyValue);
        } else if seg == "[]" {
            segments.push(PathSegment::AnyElement);
        } else if let Some(key) = seg.strip_suffix("[]") {
            segments.push(PathSegment::Key(key.to_string()));
            segments.push(PathSegment::AnyElement);
        } else {
            segments.push(PathSegment::Key(seg));
        }
    }

    Ok(segments)
}

/// Errors in field spec paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldSpecError {
    /// Path is empty
    #[error("field spec path is empty")]
    EmptyPath,

    /// Path contains an empty segment
    #[error("field spec path '{0}' contains an empty segment")]
    EmptySegment(String),

    /// Path ends with an unpaired backslash
    #[error("field spec path '{0}' ends with a dangling escape")]
    DanglingEscape(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use PathSegment::{AnyElement, AnyValue, Key};

    fn key(k: &str) -> PathSegment {
        Key(k.to_string())
    }

    #[test]
    fn compile_list_wildcard_suffix() {
        let sel = FieldSpec::new("spec/containers[]/image").compile().unwrap();
        assert_eq!(sel.pattern(), &[key("spec"), key("containers"), AnyElement, key("image")]);
        assert_eq!(sel.source(), "spec/containers[]/image");
    }

    #[test]
    fn compile_map_wildcard_and_bare_list() {
        let sel = FieldSpec::new("spec/*/[]/image").compile().unwrap();
        assert_eq!(sel.pattern(), &[key("spec"), AnyValue, AnyElement, key("image")]);
    }

    #[test]
    fn compile_escaped_slash() {
        let sel = FieldSpec::new(r"metadata/annotations/example.com\/image")
            .compile()
            .unwrap();
        assert_eq!(
            sel.pattern(),
            &[key("metadata"), key("annotations"), key("example.com/image")]
        );
    }

    #[test]
    fn compile_rejects_malformed_paths() {
        assert_eq!(FieldSpec::new("").compile(), Err(FieldSpecError::EmptyPath));
        assert!(matches!(
            FieldSpec::new("spec//image").compile(),
            Err(FieldSpecError::EmptySegment(_))
        ));
        assert!(matches!(
            FieldSpec::new("/spec").compile(),
            Err(FieldSpecError::EmptySegment(_))
        ));
        assert!(matches!(
            FieldSpec::new(r"spec\").compile(),
            Err(FieldSpecError::DanglingEscape(_))
        ));
    }

    #[test]
    fn gvk_empty_selects_everything() {
        let gvk = Gvk::default();
        assert!(gvk.is_wildcard());
        assert!(gvk.selects("apps/v1", "Deployment"));
        assert!(gvk.selects("v1", "Pod"));
        assert!(gvk.selects("", ""));
    }

    #[test]
    fn gvk_partial_selectors() {
        assert!(Gvk::kind("Deployment").selects("apps/v1", "Deployment"));
        assert!(!Gvk::kind("Deployment").selects("apps/v1", "StatefulSet"));

        let core = Gvk {
            group: String::new(),
            version: "v1".into(),
            kind: "Pod".into(),
        };
        assert!(core.selects("v1", "Pod"));
        assert!(!core.selects("v2", "Pod"));

        let batch = Gvk {
            group: "batch".into(),
            ..Gvk::default()
        };
        assert!(batch.selects("batch/v1", "CronJob"));
        assert!(!batch.selects("apps/v1", "Deployment"));
    }

    #[test]
    fn split_api_version_core_and_grouped() {
        assert_eq!(split_api_version("v1"), ("", "v1"));
        assert_eq!(split_api_version("apps/v1"), ("apps", "v1"));
        assert_eq!(split_api_version("fn.kpt.dev/v1alpha1"), ("fn.kpt.dev", "v1alpha1"));
    }

    #[test]
    fn field_spec_yaml_shape() {
        let specs: Vec<FieldSpec> = serde_yaml::from_str(
            "- path: spec/containers[]/image\n  create: true\n- path: spec/image\n  kind: Custom\n  group: example.com\n",
        )
        .unwrap();
        assert_eq!(specs.len(), 2);
        assert!(specs[0].create);
        assert!(specs[0].gvk.is_wildcard());
        assert_eq!(specs[1].gvk.kind, "Custom");
        assert_eq!(specs[1].gvk.group, "example.com");
    }
}
