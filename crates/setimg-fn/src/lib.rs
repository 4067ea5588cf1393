//! setimg Function - kpt ResourceList processing
//!
//! Wires the rewrite engine into the kpt function protocol:
//! - Reads and writes `ResourceList` envelopes
//! - Sources the rule from a `ConfigMap` or `SetImageFromConfigMap`
//! - Supplies the built-in catalog of image fields
//!
//! # Example
//!
//! ```rust
//! use setimg_core::EngineConfig;
//! use setimg_fn::{process, ResourceList};
//!
//! let input = r"
//! kind: ResourceList
//! items:
//! - kind: Pod
//!   metadata: {name: p}
//!   spec:
//!     containers:
//!     - image: nginx:1.20.2
//! functionConfig:
//!   apiVersion: fn.kpt.dev/v1alpha1
//!   kind: SetImageFromConfigMap
//!   setImageInfo: {name: nginx, newTag: 1.21.6}
//! ";
//!
//! let output = process(ResourceList::from_yaml(input).unwrap(), EngineConfig::new()).unwrap();
//! assert!(output.to_yaml().unwrap().contains("image: nginx:1.21.6"));
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod defaults;
pub mod error;
pub mod processor;
pub mod resource_list;

pub use config::{config_error_result, ConfigMapRef, SetImage, FN_CONFIG_GROUP, FN_CONFIG_KIND, FN_CONFIG_VERSION};
pub use defaults::default_image_fields;
pub use error::{ConfigError, FunctionError, FunctionResult, ResourceListError};
pub use processor::{process, Processor};
pub use resource_list::{ResourceList, RESOURCE_LIST_API_VERSION, RESOURCE_LIST_KIND};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
