//! Configuration handling for stagecraft.
//!
//! This crate loads the user's `.stagecraft.toml` (or a JSON equivalent),
//! reads package metadata from `package.json`, and resolves the partial
//! user configuration against computed defaults into a [`ResolvedConfig`].
//!
//! # Example
//!
//! ```
//! use stagecraft_config::{DefaultConfig, PackageMeta, UserConfig, resolve};
//!
//! let defaults = DefaultConfig::from_package(PackageMeta {
//!     name: "demo".to_string(),
//!     version: "1.0.0".to_string(),
//!     ..PackageMeta::default()
//! });
//! let classes = ["compile", "build", "test", "document", "package", "release", "snapshot"];
//! let config = resolve(&UserConfig::default(), &defaults, &classes).expect("resolve");
//! assert_eq!(config.title, "demo");
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

mod error;
pub mod paths;
mod resolve;
pub mod stages;

pub use error::ConfigError;
pub use paths::{PathGroup, PathGroupInput, ResolvedPaths, UserPaths};
pub use resolve::{DEFAULT_CLR, DefaultConfig, PackageMeta, ResolvedConfig, UserConfig, resolve};
pub use stages::{KnownClasses, StageEntry};

/// Default configuration file name
pub const CONFIG_FILE: &str = ".stagecraft.toml";

/// Package metadata file name
pub const PACKAGE_FILE: &str = "package.json";

/// Get the config file path for a directory
pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

/// Load the user configuration for a project directory.
///
/// Walks up from `dir` looking for [`CONFIG_FILE`]; no file means an empty
/// user configuration.
pub fn load_config(dir: &Path) -> Result<UserConfig> {
    match find_config(dir) {
        Some(path) => load_config_from_file(&path),
        None => Ok(UserConfig::default()),
    }
}

/// Load configuration from a specific file path.
///
/// Files ending in `.json` are parsed as JSON, anything else as TOML.
pub fn load_config_from_file(path: &Path) -> Result<UserConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let config = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?
    } else {
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?
    };

    Ok(config)
}

/// Save a user configuration as TOML.
pub fn save_config(path: &Path, config: &UserConfig) -> Result<()> {
    let content = toml::to_string_pretty(config).context("failed to serialize config to TOML")?;

    std::fs::write(path, content)
        .with_context(|| format!("failed to write config file: {}", path.display()))?;

    Ok(())
}

/// Find configuration file by walking up the directory tree
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir;

    loop {
        let config_file = current.join(CONFIG_FILE);
        if config_file.exists() {
            return Some(config_file);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

/// Read `package.json` from `dir`, if present.
pub fn load_package_meta(dir: &Path) -> Result<Option<PackageMeta>> {
    let path = dir.join(PACKAGE_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read package metadata: {}", path.display()))?;
    let meta = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse package metadata: {}", path.display()))?;

    Ok(Some(meta))
}
