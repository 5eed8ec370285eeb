//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use rr_core::Config;
use rr_db::DuckDbConnection;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Load `restrepo.yml` from `--config` or the project directory.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    match &global.config {
        Some(path) => Config::load(Path::new(path))
            .with_context(|| format!("Failed to load config from {}", path)),
        None => Config::load_from_dir(Path::new(&global.project_dir))
            .context("Failed to load restrepo.yml"),
    }
}

/// Database path after overrides; relative paths are taken from the
/// project directory.
pub(crate) fn database_path(config: &Config, global: &GlobalArgs) -> String {
    let path = global
        .database
        .clone()
        .unwrap_or_else(|| config.database.path.clone());
    if path == ":memory:" || Path::new(&path).is_absolute() {
        return path;
    }
    PathBuf::from(&global.project_dir)
        .join(path)
        .display()
        .to_string()
}

pub(crate) fn open_database(config: &Config, global: &GlobalArgs) -> Result<DuckDbConnection> {
    let path = database_path(config, global);
    log::debug!("Opening database {}", path);
    DuckDbConnection::new(&path).with_context(|| format!("Failed to open database {}", path))
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
