pub mod sites;
pub mod start;
pub mod status;
pub mod stop;

use crate::config::{self, Config};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Resolve and load the config file, returning where it came from.
pub(crate) fn load_config(flag: Option<&Path>) -> Result<(PathBuf, Config)> {
    let path = config::resolve_path(flag);
    let config = Config::load(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    Ok((path, config))
}
