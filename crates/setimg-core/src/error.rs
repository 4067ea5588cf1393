//! Error types for the rewrite engine
//!
//! - Image parse failures (targeted scalar is not an image reference)
//! - Transform failures (malformed field specs, invalid images with provenance)
//!
//! Every transform error aborts the whole pass.

use setimg_resource::{FieldSpecError, ResourceIdentifier};

/// Image reference grammar errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageParseError {
    /// Input string is empty
    #[error("image reference is empty")]
    Empty,
}

/// Errors that abort a transform pass
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// A field spec path could not be compiled
    #[error("invalid field spec: {0}")]
    InvalidFieldSpec(#[from] FieldSpecError),

    /// A targeted scalar is not a valid image reference
    #[error("invalid image at {field_path} in {resource}: {source}")]
    InvalidImage {
        /// Resource holding the value
        resource: ResourceIdentifier,
        /// Concrete path of the value
        field_path: String,
        /// Grammar failure
        #[source]
        source: ImageParseError,
    },
}

impl TransformError {
    /// Create invalid image error
    pub fn invalid_image(
        resource: &ResourceIdentifier,
        field_path: impl Into<String>,
        source: ImageParseError,
    ) -> Self {
        Self::InvalidImage {
            resource: resource.clone(),
            field_path: field_path.into(),
            source,
        }
    }
}

/// Result type alias for transform operations
pub type TransformResult<T> = Result<T, TransformError>;
