//! Resource documents
//!
//! A [`Resource`] wraps one manifest tree together with the identity
//! metadata and file provenance captured when it was loaded. Identity and
//! provenance never change afterwards; only string scalars addressed by a
//! [`FieldPath`] may be rewritten.

use crate::path::{FieldPath, Step};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fmt::{self, Display, Formatter};

/// Annotation carrying the source file path
pub const PATH_ANNOTATION: &str = "internal.config.kubernetes.io/path";

/// Annotation carrying the position within the source file
pub const INDEX_ANNOTATION: &str = "internal.config.kubernetes.io/index";

/// Legacy spelling of [`PATH_ANNOTATION`]
pub const LEGACY_PATH_ANNOTATION: &str = "config.kubernetes.io/path";

/// Legacy spelling of [`INDEX_ANNOTATION`]
pub const LEGACY_INDEX_ANNOTATION: &str = "config.kubernetes.io/index";

/// Identity of a resource: type and name metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceIdentifier {
    /// `apiVersion` (may be empty)
    #[serde(default)]
    pub api_version: String,

    /// `kind` (may be empty)
    #[serde(default)]
    pub kind: String,

    /// `metadata.name` (may be empty)
    #[serde(default)]
    pub name: String,

    /// `metadata.namespace` (may be empty)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

impl ResourceIdentifier {
    /// Create identifier
    #[inline]
    #[must_use]
    pub fn new(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Read identity metadata from a manifest tree
    #[must_use]
    pub fn from_tree(tree: &Value) -> Self {
        let metadata = tree.get("metadata");
        Self {
            api_version: str_at(tree.get("apiVersion")),
            kind: str_at(tree.get("kind")),
            name: str_at(metadata.and_then(|m| m.get("name"))),
            namespace: str_at(metadata.and_then(|m| m.get("namespace"))),
        }
    }
}

impl Display for ResourceIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api_version, self.kind)?;
        if !self.namespace.is_empty() {
            write!(f, " {}/{}", self.namespace, self.name)
        } else {
            write!(f, " {}", self.name)
        }
    }
}

/// Where a resource came from
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileRef {
    /// Source file path (may be empty)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,

    /// Position within the source file
    #[serde(default)]
    pub index: usize,
}

impl FileRef {
    /// Read provenance annotations, preferring the internal spellings
    #[must_use]
    pub fn from_tree(tree: &Value) -> Self {
        let annotations = tree.get("metadata").and_then(|m| m.get("annotations"));
        let lookup = |primary: &str, legacy: &str| -> Option<String> {
            let annotations = annotations?;
            annotations
                .get(primary)
                .or_else(|| annotations.get(legacy))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let path = lookup(PATH_ANNOTATION, LEGACY_PATH_ANNOTATION).unwrap_or_default();
        let index = match lookup(INDEX_ANNOTATION, LEGACY_INDEX_ANNOTATION) {
            Some(raw) => raw.trim().parse::<usize>().unwrap_or_else(|_| {
                tracing::warn!(path = %path, index = %raw, "ignoring non-numeric file index annotation");
                0
            }),
            None => 0,
        };

        Self { path, index }
    }
}

/// One manifest document with identity and provenance
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    id: ResourceIdentifier,
    file: FileRef,
    tree: Value,
}

impl Resource {
    /// Wrap a manifest tree
    ///
    /// # Errors
    /// Returns error if the tree is not a mapping
    pub fn from_value(tree: Value) -> Result<Self, DocumentError> {
        if !tree.is_mapping() {
            return Err(DocumentError::NotAMapping(value_kind(&tree)));
        }
        Ok(Self {
            id: ResourceIdentifier::from_tree(&tree),
            file: FileRef::from_tree(&tree),
            tree,
        })
    }

    /// Parse a single YAML document
    ///
    /// # Errors
    /// Returns error if the text is not YAML or not a mapping
    pub fn from_yaml(yaml: &str) -> Result<Self, DocumentError> {
        let tree: Value = serde_yaml::from_str(yaml).map_err(DocumentError::InvalidYaml)?;
        Self::from_value(tree)
    }

    /// Identity metadata
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ResourceIdentifier {
        &self.id
    }

    /// File provenance
    #[inline]
    #[must_use]
    pub fn file(&self) -> &FileRef {
        &self.file
    }

    /// Manifest tree
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// Check group, version and kind against `apiVersion`/`kind`
    #[must_use]
    pub fn is_gvk(&self, group: &str, version: &str, kind: &str) -> bool {
        let (g, v) = crate::fieldspec::split_api_version(&self.id.api_version);
        g == group && v == version && self.id.kind == kind
    }

    /// Get node at a concrete path
    #[must_use]
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        let mut current = &self.tree;
        for step in path.iter() {
            current = match (step, current) {
                (Step::Key(key), Value::Mapping(map)) => map.get(key.as_str())?,
                (Step::Index(index), Value::Sequence(seq)) => seq.get(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Replace the string scalar at `path`
    ///
    /// Returns the previous value, or `None` (leaving the tree untouched)
    /// when the path does not address a string scalar.
    pub fn set_scalar(&mut self, path: &FieldPath, value: impl Into<String>) -> Option<String> {
        let mut current = &mut self.tree;
        for step in path.iter() {
            current = match (step, current) {
                (Step::Key(key), Value::Mapping(map)) => map.get_mut(key.as_str())?,
                (Step::Index(index), Value::Sequence(seq)) => seq.get_mut(*index)?,
                _ => return None,
            };
        }
        match current {
            Value::String(s) => Some(std::mem::replace(s, value.into())),
            _ => None,
        }
    }

    /// Consume into the manifest tree
    #[inline]
    #[must_use]
    pub fn into_value(self) -> Value {
        self.tree
    }

    /// Serialize the tree as YAML
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_yaml(&self) -> Result<String, DocumentError> {
        serde_yaml::to_string(&self.tree).map_err(DocumentError::InvalidYaml)
    }
}

impl Default for Resource {
    fn default() -> Self {
        Self {
            id: ResourceIdentifier::default(),
            file: FileRef::default(),
            tree: Value::Mapping(Mapping::new()),
        }
    }
}

impl TryFrom<Value> for Resource {
    type Error = DocumentError;

    fn try_from(tree: Value) -> Result<Self, Self::Error> {
        Self::from_value(tree)
    }
}

fn str_at(value: Option<&Value>) -> String {
    value.and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Short name of a node's type, for error messages
#[must_use]
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Document errors
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Document root is not a mapping
    #[error("resource must be a mapping, got {0}")]
    NotAMapping(&'static str),

    /// Document text is not valid YAML
    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
}
