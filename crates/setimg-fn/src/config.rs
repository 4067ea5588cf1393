//! Function configuration
//!
//! Two `functionConfig` shapes are understood:
//!
//! ```yaml
//! apiVersion: v1
//! kind: ConfigMap
//! data:
//!   name: image-rules          # config map among the items
//! ---
//! apiVersion: fn.kpt.dev/v1alpha1
//! kind: SetImageFromConfigMap
//! configMap:
//!   name: image-rules
//! setImageInfo:
//!   name: nginx
//!   newTag: 1.21.6
//! additionalImageFields:
//! - path: spec/sidecar/image
//!   kind: MyWorkload
//! ```
//!
//! When a config map is named, every `v1/ConfigMap` item with that name
//! replaces the rule with its `data`; the last one wins.
//!
//! Both sources read rule fields the same way: integers and booleans are
//! taken as text, floating-point scalars such as `newTag: 1.20` must be
//! quoted.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use setimg_core::{scalar_text, FnResult, RewriteRule};
use setimg_resource::{split_api_version, FieldSpec, Resource, ResourceIdentifier};

/// Group of the typed function config
pub const FN_CONFIG_GROUP: &str = "fn.kpt.dev";

/// Version of the typed function config
pub const FN_CONFIG_VERSION: &str = "v1alpha1";

/// Kind of the typed function config
pub const FN_CONFIG_KIND: &str = "SetImageFromConfigMap";

/// Reference to a config map among the items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMapRef {
    /// `metadata.name` of the config map
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "String::is_empty")]
    pub name: String,
}

/// Resolved set-image configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetImage {
    /// Config map carrying the rule
    #[serde(default)]
    pub config_map: ConfigMapRef,

    /// Rule to apply
    #[serde(default)]
    pub set_image_info: RewriteRule,

    /// Field specs searched before the default catalog
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_image_fields: Vec<FieldSpec>,
}

impl SetImage {
    /// Read the `functionConfig` object
    ///
    /// # Errors
    /// Returns error if the object is missing, of an unsupported kind, or
    /// malformed
    pub fn from_function_config(config: Option<&Value>) -> Result<Self, ConfigError> {
        let config = config.ok_or(ConfigError::Missing)?;
        let id = ResourceIdentifier::from_tree(config);
        let (group, version) = split_api_version(&id.api_version);

        match (group, version, id.kind.as_str()) {
            ("", "v1", "ConfigMap") => {
                let data = data_of(config);
                let config_map: ConfigMapRef = serde_yaml::from_value(data)
                    .map_err(|e| ConfigError::invalid_data("ConfigMap functionConfig data", e))?;
                Ok(Self {
                    config_map,
                    ..Self::default()
                })
            }
            (FN_CONFIG_GROUP, FN_CONFIG_VERSION, FN_CONFIG_KIND) => serde_yaml::from_value(config.clone())
                .map_err(|e| ConfigError::invalid_data(FN_CONFIG_KIND, e)),
            _ => Err(ConfigError::UnsupportedKind {
                api_version: id.api_version.clone(),
                kind: id.kind.clone(),
            }),
        }
    }

    /// Load the rule from the referenced config map, if any
    ///
    /// Leaves the rule untouched when no config map is named or none of
    /// the items matches.
    ///
    /// # Errors
    /// Returns error if a matching config map's data is malformed
    pub fn resolve_config_map(&mut self, items: &[Resource]) -> Result<(), ConfigError> {
        if self.config_map.name.is_empty() {
            return Ok(());
        }

        let mut found = false;
        for item in items {
            if item.is_gvk("", "v1", "ConfigMap") && item.id().name == self.config_map.name {
                let data = data_of(item.tree());
                self.set_image_info = serde_yaml::from_value(data).map_err(|e| {
                    ConfigError::invalid_data(format!("data of ConfigMap `{}`", self.config_map.name), e)
                })?;
                found = true;
            }
        }

        if !found {
            tracing::warn!(
                config_map = %self.config_map.name,
                "no ConfigMap item with this name; using the inline rule"
            );
        }
        Ok(())
    }

    /// Read and resolve the configuration for one run
    ///
    /// # Errors
    /// Returns error if the configuration cannot be read
    pub fn load(config: Option<&Value>, items: &[Resource]) -> Result<Self, ConfigError> {
        let mut set_image = Self::from_function_config(config)?;
        set_image.resolve_config_map(items)?;
        tracing::debug!(rule = ?set_image.set_image_info, "resolved set-image configuration");
        Ok(set_image)
    }

    /// Active field specs: additional fields, then `defaults`
    #[must_use]
    pub fn field_specs(&self, defaults: &[FieldSpec]) -> Vec<FieldSpec> {
        self.additional_image_fields
            .iter()
            .chain(defaults)
            .cloned()
            .collect()
    }
}

/// Error result scoped to the `functionConfig` object
#[must_use]
pub fn config_error_result(err: &ConfigError, config: Option<&Value>) -> FnResult {
    let result = FnResult::error(err.to_string());
    match config {
        Some(config) => result.with_resource_ref(ResourceIdentifier::from_tree(config)),
        None => result,
    }
}

// An absent or empty `data` reads as no keys.
fn data_of(config_map: &Value) -> Value {
    match config_map.get("data") {
        None | Some(Value::Null) => Value::Mapping(Mapping::new()),
        Some(data) => data.clone(),
    }
}
