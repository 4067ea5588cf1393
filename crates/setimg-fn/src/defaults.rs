//! Built-in image field catalog

use crate::error::ConfigError;
use serde::Deserialize;
use setimg_resource::FieldSpec;

const DEFAULT_IMAGE_FIELDS: &str = include_str!("../catalog/images.yaml");

#[derive(Debug, Deserialize)]
struct Catalog {
    images: Vec<FieldSpec>,
}

/// Well-known container image locations
///
/// # Errors
/// Returns error if the embedded catalog does not parse
pub fn default_image_fields() -> Result<Vec<FieldSpec>, ConfigError> {
    let catalog: Catalog = serde_yaml::from_str(DEFAULT_IMAGE_FIELDS).map_err(ConfigError::InvalidCatalog)?;
    Ok(catalog.images)
}
