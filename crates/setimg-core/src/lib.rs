//! setimg Core - Image Rewrite Engine
//!
//! The field-targeted mutation engine:
//! - Parses and formats container image references
//! - Applies a declarative [`RewriteRule`] to every image a field spec reaches
//! - Records provenance for every changed value
//! - Aggregates provenance into a deterministic, sorted report
//!
//! # Example
//!
//! ```rust
//! use setimg_core::{transform, RewriteRule};
//! use setimg_resource::{FieldSpec, Resource};
//!
//! let pod = Resource::from_yaml(
//!     "kind: Pod\nmetadata:\n  name: p\nspec:\n  containers:\n  - image: nginx:1.20.2\n",
//! ).unwrap();
//! let rule = RewriteRule::matching("nginx").with_new_tag("1.21.6");
//! let specs = [FieldSpec::new("spec/containers[]/image")];
//!
//! let output = transform(&rule, &specs, vec![pod]).unwrap();
//! assert_eq!(output.results()[0].message, "set image from nginx:1.20.2 to nginx:1.21.6");
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod image;
pub mod result;
pub mod rule;
pub mod tracker;
pub mod transform;

// Re-exports for convenience
pub use config::{EngineConfig, CRD_KIND};
pub use error::{ImageParseError, TransformError, TransformResult};
pub use image::ImageReference;
pub use result::{aggregate, sort_results, FnResult, ResultField, Severity, NO_CHANGES_MESSAGE};
pub use rule::{scalar_text, Rewrite, RewriteRule};
pub use tracker::{Change, MutationKey, MutationTracker};
pub use transform::{transform, ImageTransformer, TransformOutput};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
