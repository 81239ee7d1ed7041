//! Service Configuration Module
//!
//! Loads a typed configuration from an optional TOML file with environment
//! variable overrides layered on top.

use anyhow::{Context, Result};
use config_crate::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Prefix for environment overrides, e.g. `TRENDLINE_ALERTS__TICK_SECS=30`
pub const ENV_PREFIX: &str = "TRENDLINE";

/// Load `T` from `path` (if present) and `{env_prefix}_*` environment variables.
///
/// Nested keys use a double underscore: `TRENDLINE_SIGNALS__BAR_LIMIT`. Fields missing
/// from both layers come from `T`'s serde defaults, so `T` should be
/// `#[serde(default)]`.
pub fn load_config<T: DeserializeOwned>(path: impl AsRef<Path>, env_prefix: &str) -> Result<T> {
    let path = path.as_ref();

    let mut builder = Config::builder();
    if path.exists() {
        info!("Loading configuration file: {:?}", path);
        builder = builder.add_source(File::from(path).required(true));
    } else {
        warn!("Configuration file not found: {:?}, using defaults", path);
    }

    builder = builder.add_source(
        Environment::with_prefix(env_prefix)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build().context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Path from `env_var` if set, otherwise `default_path`
pub fn resolve_config_path(env_var: &str, default_path: &str) -> PathBuf {
    match std::env::var(env_var) {
        Ok(path) if !path.trim().is_empty() => {
            debug!("Using config path from {}: {}", env_var, path);
            PathBuf::from(path)
        }
        _ => PathBuf::from(default_path),
    }
}

/// Expand `~` and `$VAR` references in a configured path
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded =
        shellexpand::full(raw).with_context(|| format!("Failed to expand path '{}'", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}
