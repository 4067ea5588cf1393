//! ResourceList processing
//!
//! One function run: read the configuration, rewrite the items, append the
//! report. A configuration the user can fix becomes a single error result
//! and the items pass through untouched. Anything else fails the run and no
//! ResourceList is produced.

use crate::config::{config_error_result, SetImage};
use crate::defaults::default_image_fields;
use crate::error::FunctionResult;
use crate::resource_list::ResourceList;
use setimg_core::{EngineConfig, ImageTransformer};
use setimg_resource::FieldSpec;

/// Runs the set-image function over ResourceLists
#[derive(Debug, Clone)]
pub struct Processor {
    engine: EngineConfig,
    defaults: Vec<FieldSpec>,
}

impl Processor {
    /// Create a processor with the built-in field catalog
    ///
    /// # Errors
    /// Returns error if the built-in catalog cannot be loaded
    pub fn new(engine: EngineConfig) -> FunctionResult<Self> {
        Ok(Self::with_defaults(engine, default_image_fields()?))
    }

    /// Create a processor with a custom default catalog
    #[inline]
    #[must_use]
    pub fn with_defaults(engine: EngineConfig, defaults: Vec<FieldSpec>) -> Self {
        Self { engine, defaults }
    }

    /// Process one ResourceList
    ///
    /// # Errors
    /// Returns error if a field spec is malformed, a targeted value is not
    /// an image reference, or a result cannot be rendered
    pub fn process(&self, mut list: ResourceList) -> FunctionResult<ResourceList> {
        let set_image = match SetImage::load(list.function_config.as_ref(), &list.items) {
            Ok(set_image) => set_image,
            Err(err) => {
                tracing::error!(error = %err, "invalid function configuration");
                let result = config_error_result(&err, list.function_config.as_ref());
                list.push_results(&[result])?;
                return Ok(list);
            }
        };

        let specs = set_image.field_specs(&self.defaults);
        let transformer = ImageTransformer::new(set_image.set_image_info, &specs, self.engine.clone())?;
        let output = transformer.transform(std::mem::take(&mut list.items))?;

        let results = output.results();
        list.items = output.resources;
        list.push_results(&results)?;
        Ok(list)
    }
}

/// Process one ResourceList with the built-in catalog
///
/// # Errors
/// See [`Processor::process`]
pub fn process(list: ResourceList, engine: EngineConfig) -> FunctionResult<ResourceList> {
    Processor::new(engine)?.process(list)
}
