//! ResourceList envelope
//!
//! The kpt function wire format:
//!
//! ```yaml
//! apiVersion: config.kubernetes.io/v1
//! kind: ResourceList
//! items: [...]
//! functionConfig: {...}
//! results: [...]
//! ```
//!
//! Top-level keys the function does not own are carried through unchanged
//! and in their original order.

use crate::error::ResourceListError;
use serde_yaml::{Mapping, Value};
use setimg_core::FnResult;
use setimg_resource::{value_kind, Resource};

/// API group of the envelope
pub const RESOURCE_LIST_GROUP: &str = "config.kubernetes.io";

/// Default envelope `apiVersion`
pub const RESOURCE_LIST_API_VERSION: &str = "config.kubernetes.io/v1";

/// Envelope `kind`
pub const RESOURCE_LIST_KIND: &str = "ResourceList";

const ITEMS: &str = "items";
const FUNCTION_CONFIG: &str = "functionConfig";
const RESULTS: &str = "results";

/// A kpt ResourceList
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceList {
    /// Documents in input order
    pub items: Vec<Resource>,

    /// Function configuration object
    pub function_config: Option<Value>,

    /// Results carried in by earlier functions, followed by this run's
    pub results: Vec<Value>,

    envelope: Mapping,
}

impl ResourceList {
    /// Create an envelope around `items`
    #[must_use]
    pub fn new(items: Vec<Resource>) -> Self {
        let mut envelope = Mapping::new();
        envelope.insert("apiVersion".into(), RESOURCE_LIST_API_VERSION.into());
        envelope.insert("kind".into(), RESOURCE_LIST_KIND.into());
        Self {
            items,
            function_config: None,
            results: Vec::new(),
            envelope,
        }
    }

    /// With function configuration
    #[inline]
    #[must_use]
    pub fn with_function_config(mut self, config: Value) -> Self {
        self.function_config = Some(config);
        self
    }

    /// Parse a YAML or JSON ResourceList
    ///
    /// # Errors
    /// Returns error if the text is not a well-formed ResourceList
    pub fn from_yaml(input: &str) -> Result<Self, ResourceListError> {
        let root: Value = serde_yaml::from_str(input)?;
        Self::from_value(root)
    }

    /// Read a ResourceList from a parsed tree
    ///
    /// # Errors
    /// Returns error if the tree is not a well-formed ResourceList
    pub fn from_value(root: Value) -> Result<Self, ResourceListError> {
        let mut envelope = match root {
            Value::Mapping(envelope) => envelope,
            other => {
                return Err(ResourceListError::InvalidField {
                    field: "<root>",
                    expected: "mapping",
                    actual: value_kind(&other),
                })
            }
        };

        let kind = envelope.get("kind").and_then(Value::as_str).unwrap_or_default();
        if kind != RESOURCE_LIST_KIND {
            return Err(ResourceListError::NotAResourceList(kind.to_string()));
        }
        if let Some(api_version) = envelope.get("apiVersion").and_then(Value::as_str) {
            let in_group = api_version
                .split_once('/')
                .is_some_and(|(group, _)| group == RESOURCE_LIST_GROUP);
            if !in_group {
                return Err(ResourceListError::UnsupportedApiVersion(api_version.to_string()));
            }
        }

        let items = match take_sequence(&mut envelope, ITEMS)? {
            Some(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| {
                    Resource::from_value(item)
                        .map_err(|source| ResourceListError::InvalidItem { index, source })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        let results = take_sequence(&mut envelope, RESULTS)?.unwrap_or_default();
        let function_config = envelope
            .get(FUNCTION_CONFIG)
            .filter(|config| !config.is_null())
            .cloned();

        tracing::debug!(items = items.len(), results = results.len(), "read ResourceList");
        Ok(Self {
            items,
            function_config,
            results,
            envelope,
        })
    }

    /// Append results from this run
    ///
    /// # Errors
    /// Returns error if a result cannot be represented as YAML
    pub fn push_results(&mut self, results: &[FnResult]) -> Result<(), ResourceListError> {
        for result in results {
            self.results.push(serde_yaml::to_value(result)?);
        }
        Ok(())
    }

    /// Check whether any result has `error` severity
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.results
            .iter()
            .any(|r| r.get("severity").and_then(Value::as_str) == Some("error"))
    }

    /// Render the envelope as a tree
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut root = self.envelope.clone();
        root.insert(
            ITEMS.into(),
            Value::Sequence(self.items.iter().map(|r| r.tree().clone()).collect()),
        );
        if let Some(config) = &self.function_config {
            root.insert(FUNCTION_CONFIG.into(), config.clone());
        }
        if !self.results.is_empty() {
            root.insert(RESULTS.into(), Value::Sequence(self.results.clone()));
        }
        Value::Mapping(root)
    }

    /// Render as YAML
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_yaml(&self) -> Result<String, ResourceListError> {
        Ok(serde_yaml::to_string(&self.to_value())?)
    }

    /// Render as pretty-printed JSON
    ///
    /// # Errors
    /// Returns error if the tree holds values JSON cannot represent
    pub fn to_json(&self) -> Result<String, ResourceListError> {
        Ok(serde_json::to_string_pretty(&self.to_value())?)
    }
}

impl Default for ResourceList {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

// Leaves a null placeholder so the key keeps its position on output.
fn take_sequence(envelope: &mut Mapping, field: &'static str) -> Result<Option<Vec<Value>>, ResourceListError> {
    let Some(slot) = envelope.get_mut(field) else {
        return Ok(None);
    };
    match std::mem::take(slot) {
        Value::Null => Ok(None),
        Value::Sequence(seq) => Ok(Some(seq)),
        other => Err(ResourceListError::InvalidField {
            field,
            expected: "sequence",
            actual: value_kind(&other),
        }),
    }
}
