//! Error types for the set-image function
//!
//! - [`ConfigError`]: the function configuration cannot be understood
//! - [`ResourceListError`]: the input envelope is malformed
//! - [`FunctionError`]: anything that fails a run

use setimg_core::TransformError;
use setimg_resource::DocumentError;

/// Errors while reading the function configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No `functionConfig` supplied
    #[error("`functionConfig` is required: provide a `ConfigMap` or `SetImageFromConfigMap`")]
    Missing,

    /// `functionConfig` of an unsupported kind
    #[error("`functionConfig` must be a `ConfigMap` or `SetImageFromConfigMap`, got `{api_version}/{kind}`")]
    UnsupportedKind {
        /// `apiVersion` of the supplied object
        api_version: String,
        /// `kind` of the supplied object
        kind: String,
    },

    /// Configuration data has the wrong shape
    #[error("invalid {what}: {source}")]
    InvalidData {
        /// Which configuration object was being read
        what: String,
        /// Decoding failure
        #[source]
        source: serde_yaml::Error,
    },

    /// Built-in field spec catalog failed to load
    #[error("invalid default image field catalog: {0}")]
    InvalidCatalog(#[source] serde_yaml::Error),
}

impl ConfigError {
    /// Create invalid data error
    pub fn invalid_data(what: impl Into<String>, source: serde_yaml::Error) -> Self {
        Self::InvalidData {
            what: what.into(),
            source,
        }
    }
}

/// Errors while reading or writing a ResourceList
#[derive(Debug, thiserror::Error)]
pub enum ResourceListError {
    /// Input is not YAML (or JSON)
    #[error("invalid ResourceList: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    /// Output could not be rendered as JSON
    #[error("cannot render ResourceList as JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Root is not a ResourceList
    #[error("expected kind `ResourceList`, got `{0}`")]
    NotAResourceList(String),

    /// `apiVersion` outside the `config.kubernetes.io` group
    #[error("unsupported ResourceList apiVersion `{0}`")]
    UnsupportedApiVersion(String),

    /// A top-level field has the wrong type
    #[error("ResourceList field `{field}` must be a {expected}, got {actual}")]
    InvalidField {
        /// Envelope field name
        field: &'static str,
        /// Required YAML node kind
        expected: &'static str,
        /// YAML node kind found
        actual: &'static str,
    },

    /// An item is not a resource
    #[error("item {index}: {source}")]
    InvalidItem {
        /// Position in `items`
        index: usize,
        /// Why the item was rejected
        #[source]
        source: DocumentError,
    },
}

/// Errors that fail a function run
///
/// Configuration problems the user can fix are reported as results instead;
/// only the variants here abort without output.
#[derive(Debug, thiserror::Error)]
pub enum FunctionError {
    /// Configuration error
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// ResourceList error
    #[error(transparent)]
    ResourceList(#[from] ResourceListError),

    /// Transform error
    #[error("transform: {0}")]
    Transform(#[from] TransformError),
}

/// Result type for function operations
pub type FunctionResult<T> = Result<T, FunctionError>;
