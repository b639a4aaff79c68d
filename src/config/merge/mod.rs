//! Config source composition.

pub mod service;

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};

/// Builder seeded with the built-in defaults (lowest precedence).
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("languages", vec!["en"])?
        .set_default("default_language", "en")?
        .set_default("development", false)?
        .set_default("sync.chunk_size", 10_i64)
}
