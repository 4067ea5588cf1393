//! setimg Resource Model
//!
//! Manifest documents, identity metadata and declarative field addressing.
//!
//! # Core Concepts
//!
//! - [`Resource`]: One manifest tree with identity and file provenance
//! - [`FieldSpec`]: Kind selector plus wildcard-capable path pattern
//! - [`FieldPath`]: Concrete path to a single node
//! - [`resolve`]: Lazily yields every string scalar a selector reaches
//!
//! # Example
//!
//! ```rust
//! use setimg_resource::{resolve, FieldSpec, Resource};
//!
//! let pod = Resource::from_yaml(
//!     "kind: Pod\nspec:\n  containers:\n  - image: nginx:1.20.2\n",
//! ).unwrap();
//! let selector = FieldSpec::new("spec/containers[]/image").compile().unwrap();
//!
//! let found: Vec<_> = resolve(&selector, &pod).map(|loc| loc.path.to_string()).collect();
//! assert_eq!(found, vec!["spec.containers[0].image"]);
//! ```

#![warn(unreachable_pub)]

mod document;
mod fieldspec;
mod path;
mod resolve;

pub use document::{
    value_kind, DocumentError, FileRef, Resource, ResourceIdentifier, INDEX_ANNOTATION,
    LEGACY_INDEX_ANNOTATION, LEGACY_PATH_ANNOTATION, PATH_ANNOTATION,
};
pub use fieldspec::{split_api_version, FieldSelector, FieldSpec, FieldSpecError, Gvk, PathSegment};
pub use path::{FieldPath, FieldPathError, Step};
pub use resolve::{resolve, Locations, NodeLocation};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
