//! Single entry point for loading configuration.

use super::merge::builder_with_defaults;
use super::sources::{environment, global_file, workspace_file};
use super::BambooConfig;
use crate::error::ConfigError;
use config::File;
use std::path::Path;
use tracing::debug;

/// Loads and validates [`BambooConfig`] from every layered source
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, global file, workspace files, then environment.
    pub fn load(workspace_root: &Path) -> Result<BambooConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);
        Self::finish(builder.build()?)
    }

    /// Load the current directory's workspace configuration.
    pub fn load_default() -> Result<BambooConfig, ConfigError> {
        Self::load(Path::new("."))
    }

    /// Defaults overlaid with a single explicit file, ignoring other sources.
    pub fn load_from_file(path: &Path) -> Result<BambooConfig, ConfigError> {
        let config = builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?;
        Self::finish(config)
    }

    fn finish(config: config::Config) -> Result<BambooConfig, ConfigError> {
        let config: BambooConfig = config.try_deserialize()?;
        config.validate().map_err(|errors| {
            ConfigError::Invalid(errors.iter().map(ToString::to_string).collect())
        })?;
        debug!(
            cache_capacity = config.cache.capacity,
            similarity_threshold = config.source.similarity_threshold,
            "Configuration loaded"
        );
        Ok(config)
    }
}
