use std::path::Path;

use anyhow::{Result, bail};
use chrono::{DateTime, Local};
use serde_json::json;
use stagecraft_types::{Args, ArgsExt};

use super::{object, package_name};
use crate::fs::is_contained;
use crate::stage::{Stage, StageClass, SubStage};

/// Copies the sources into a timestamped snapshot directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotStage;

impl StageClass for SnapshotStage {
    fn class_name(&self) -> &str {
        "snapshot"
    }

    fn default_args(&self) -> Args {
        object(json!({ "include": ["src", "package.json"] }))
    }

    fn sub_stages(&self) -> Vec<SubStage<'_>> {
        vec![SubStage::new("archive", archive)]
    }
}

fn snapshot_name(name: &str, at: DateTime<Local>) -> String {
    format!("{name}-{}", at.format("%Y%m%d-%H%M%S"))
}

fn archive(stage: &Stage<'_>) -> Result<()> {
    let files = stage.files();
    let name = snapshot_name(&package_name(stage.config()), Local::now());
    let target = files.resolve(&stage.config().paths.snapshot).join(name);

    let mut copied = 0usize;
    for include in stage.args().strings_arg("include").unwrap_or_default() {
        if !is_contained(Path::new(&include)) {
            bail!("snapshot include `{include}` escapes the project root");
        }
        if files.is_dir(&include) {
            copied += files.copy_dir(&include, target.join(&include))?;
        } else if files.is_file(&include) {
            files.copy_file(&include, target.join(&include))?;
            copied += 1;
        } else {
            stage.verbose(&format!("{include} not found; not included"), 2);
        }
    }

    stage.progress(
        &format!("{copied} file(s) -> {}", files.relative(&target).display()),
        2,
    );
    Ok(())
}
