//! Built-in defaults, the lowest-precedence layer.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with every default applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("cache.capacity", crate::cache::DEFAULT_CAPACITY as i64)?
        .set_default("pipeline.stats_on_stop", true)?
        .set_default(
            "source.similarity_threshold",
            crate::source::DEFAULT_SIMILARITY_THRESHOLD,
        )?
        .set_default("source.follow_symlinks", false)?
        .set_default("writer.jpeg_quality", crate::frame::DEFAULT_JPEG_QUALITY as i64)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")
}
