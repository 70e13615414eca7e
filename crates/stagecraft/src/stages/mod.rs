//! Built-in stage classes, one per stage name.

mod build;
mod compile;
mod document;
mod package;
mod release;
mod snapshot;

pub use build::BuildStage;
pub use compile::CompileStage;
pub use document::DocumentStage;
pub use package::PackageStage;
pub use release::ReleaseStage;
pub use snapshot::SnapshotStage;
pub use test::TestStage;

use anyhow::{Result, bail};
use serde_json::Value;
use stagecraft_config::ResolvedConfig;
use stagecraft_types::Args;

/// Package name used in artifact names, falling back to a slug of the title.
pub(crate) fn package_name(config: &ResolvedConfig) -> String {
    let name = config.package.name.trim();
    if !name.is_empty() {
        return name.trim_start_matches('@').replace('/', "-");
    }
    config
        .title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Version required by the package and release stages.
pub(crate) fn package_version(config: &ResolvedConfig) -> Result<&str> {
    let version = config.package.version.trim();
    if version.is_empty() {
        bail!("package.json has no version");
    }
    Ok(version)
}

/// `<name>-<version>`, the base name of release artifacts.
pub(crate) fn artifact_name(config: &ResolvedConfig) -> Result<String> {
    Ok(format!("{}-{}", package_name(config), package_version(config)?))
}

pub(crate) fn object(value: Value) -> Args {
    match value {
        Value::Object(map) => map,
        _ => Args::new(),
    }
}
