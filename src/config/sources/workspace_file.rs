//! Workspace file source: optional `catalog.toml` in the working directory

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use std::path::Path;

/// Name of the configuration file looked up in the workspace root
pub const WORKSPACE_CONFIG_FILE: &str = "catalog.toml";

/// Add the workspace config file to the builder; a missing file is not an error.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let path = workspace_root.join(WORKSPACE_CONFIG_FILE);
    Ok(builder.add_source(
        File::from(path.as_path())
            .format(FileFormat::Toml)
            .required(false),
    ))
}
