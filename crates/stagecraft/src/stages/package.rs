use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_json::json;
use stagecraft_process::{command_exists, run_command_in_dir};
use stagecraft_types::{Args, ArgsExt, StageName};

use super::{artifact_name, object};
use crate::fs::{Files, is_contained};
use crate::stage::{Stage, StageClass, SubStage};

/// Builds, then assembles the release directory and its zip archive.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageStage;

impl StageClass for PackageStage {
    fn class_name(&self) -> &str {
        "package"
    }

    fn clr(&self) -> &str {
        "cyan"
    }

    fn default_args(&self) -> Args {
        object(json!({ "include": ["package.json", "README.md", "LICENSE"] }))
    }

    fn sub_stages(&self) -> Vec<SubStage<'_>> {
        vec![
            SubStage::new("build", |stage: &Stage<'_>| stage.run_stage(StageName::Build, 1)),
            SubStage::new("copy", copy),
            SubStage::new("zip", zip),
        ]
    }
}

/// `<release>/<name>-<version>` for this project.
pub(crate) fn release_dir(stage: &Stage<'_>) -> Result<PathBuf> {
    let name = artifact_name(stage.config())?;
    Ok(stage.files().resolve(&stage.config().paths.release).join(name))
}

/// `<release>/<name>-<version>.zip` for this project.
pub(crate) fn archive_path(stage: &Stage<'_>) -> Result<PathBuf> {
    let name = artifact_name(stage.config())?;
    Ok(stage
        .files()
        .resolve(&stage.config().paths.release)
        .join(format!("{name}.zip")))
}

fn copy(stage: &Stage<'_>) -> Result<()> {
    let files = stage.files();
    let target = release_dir(stage)?;
    if files.delete(&target)? {
        stage.verbose(&format!("cleared {}", files.relative(&target).display()), 2);
    }

    let mut copied = 0usize;
    for (key, dir) in &stage.config().paths.dist {
        copied += files.copy_dir(dir, packaged_dist_dir(&files, &target, key, dir))?;
    }
    for extra in stage.args().strings_arg("include").unwrap_or_default() {
        if !is_contained(Path::new(&extra)) {
            bail!("package include `{extra}` escapes the project root");
        }
        if files.is_file(&extra) {
            files.copy_file(&extra, target.join(&extra))?;
            copied += 1;
        } else if files.is_dir(&extra) {
            copied += files.copy_dir(&extra, target.join(&extra))?;
        } else {
            stage.verbose(&format!("{extra} not found; not packaged"), 2);
        }
    }

    stage.progress(
        &format!("{copied} file(s) -> {}", files.relative(&target).display()),
        2,
    );
    Ok(())
}

/// Where a dist directory lands inside the release directory. Directories
/// under the project root keep their relative path; anything else goes to
/// `dist/<dir name>`.
fn packaged_dist_dir(files: &Files, target: &Path, key: &str, dir: &str) -> PathBuf {
    let rel = files.relative(files.resolve(dir));
    if is_contained(&rel) {
        return target.join(rel);
    }
    let leaf = rel.file_name().map_or_else(|| key.into(), |name| name.to_os_string());
    target.join("dist").join(leaf)
}

fn zip(stage: &Stage<'_>) -> Result<()> {
    let files = stage.files();
    let dir = release_dir(stage)?;
    let archive = archive_path(stage)?;
    stage.progress(&format!("{}", files.relative(&archive).display()), 2);
    if stage.is_dryrun() {
        return Ok(());
    }
    if !command_exists("zip") {
        bail!("zip is not installed");
    }

    let (Some(parent), Some(name)) = (dir.parent(), dir.file_name()) else {
        bail!("invalid release directory {}", dir.display());
    };
    let name = name.to_string_lossy();
    let archive_name = format!("{name}.zip");
    files.delete(&archive)?;
    let args = ["-r", "-q", archive_name.as_str(), &*name];
    run_command_in_dir("zip", &args, parent)?
        .ok()
        .with_context(|| format!("failed to create {}", archive.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::console::{LogKind, MemoryLogger};
    use crate::project::Project;
    use crate::stages::testing::{FakeCompiler, resolved, write};
    use serde_json::json;
    use stagecraft_types::{Filter, Params, StageName};
    use tempfile::tempdir;

    fn params(only: &[&str]) -> Params {
        Params {
            only: Filter::parse(only.iter().copied()),
            ..Params::for_command(StageName::Package)
        }
    }

    #[test]
    fn copy_assembles_release_directory() {
        let td = tempdir().expect("tempdir");
        write(td.path(), "dist/js/index.js", "js");
        write(td.path(), "dist/css/app.css", "css");
        write(td.path(), "package.json", "{}");
        write(td.path(), "README.md", "# demo");
        write(td.path(), "release/demo-2.0.0/stale.txt", "old");

        let logger = MemoryLogger::new();
        let project = Project::new(td.path(), resolved(json!({}), "2.0.0"), params(&["copy"]))
            .with_logger(logger.clone());
        project.run("package").expect("package");

        let out = td.path().join("release/demo-2.0.0");
        assert!(out.join("dist/js/index.js").exists());
        assert!(out.join("dist/css/app.css").exists());
        assert!(out.join("package.json").exists());
        assert!(out.join("README.md").exists());
        assert!(!out.join("stale.txt").exists());
        assert!(logger.contains(LogKind::Verbose, "LICENSE not found"));
    }

    #[test]
    fn dist_outside_the_root_is_copied_without_touching_the_source() {
        let td = tempdir().expect("tempdir");
        let out = tempdir().expect("tempdir");
        write(out.path(), "js/index.js", "compiled-bundle");
        write(td.path(), "package.json", "{}");

        let dist = out.path().display().to_string();
        let config = resolved(json!({"paths": {"dist": dist}}), "2.0.0");
        let project = Project::new(td.path(), config, params(&["copy"]));
        project.run("package").expect("package");

        assert_eq!(
            std::fs::read_to_string(out.path().join("js/index.js")).expect("source"),
            "compiled-bundle"
        );
        assert_eq!(
            std::fs::read_to_string(td.path().join("release/demo-2.0.0/dist/js/index.js"))
                .expect("packaged"),
            "compiled-bundle"
        );
    }

    #[test]
    fn absolute_dist_under_the_root_keeps_its_relative_layout() {
        let td = tempdir().expect("tempdir");
        write(td.path(), "out/js/index.js", "compiled-bundle");

        let dist = td.path().join("out").display().to_string();
        let config = resolved(json!({"paths": {"dist": dist}}), "2.0.0");
        let project = Project::new(td.path(), config, params(&["copy"]));
        project.run("package").expect("package");

        assert_eq!(
            std::fs::read_to_string(td.path().join("out/js/index.js")).expect("source"),
            "compiled-bundle"
        );
        assert!(td.path().join("release/demo-2.0.0/out/js/index.js").exists());
    }

    #[test]
    fn include_outside_root_is_rejected() {
        let td = tempdir().expect("tempdir");
        let config = resolved(json!({"stages": {"package": {"include": ["../secrets"]}}}), "1.0.0");
        let project = Project::new(td.path(), config, params(&["copy"]));
        let err = project.run("package").expect_err("escape");
        assert!(format!("{err:#}").contains("escapes the project root"));
    }

    #[test]
    fn package_requires_a_version() {
        let td = tempdir().expect("tempdir");
        let project = Project::new(td.path(), resolved(json!({}), ""), params(&["copy"]));
        let err = project.run("package").expect_err("no version");
        assert!(format!("{err:#}").contains("no version"));
    }

    #[test]
    fn dryrun_package_runs_the_whole_chain_without_writing() {
        let td = tempdir().expect("tempdir");
        write(td.path(), "src/scss/app.scss", "");
        write(td.path(), "package.json", "{}");

        let logger = MemoryLogger::new();
        let compiler = FakeCompiler::default();
        let params = Params {
            dryrun: true,
            ..params(&[])
        };
        let config = resolved(json!({"stages": {"test": false, "document": false}}), "1.0.0");
        let project = Project::new(td.path(), config, params)
            .with_logger(logger.clone())
            .with_compiler(compiler.clone());
        project.run("package").expect("package");

        assert!(compiler.calls.borrow().is_empty());
        assert!(!td.path().join("release").exists());
        assert!(!td.path().join("dist").exists());
        assert!(logger.contains(LogKind::Notice, "Starting build"));
        assert!(logger.contains(LogKind::Progress, "release/demo-1.0.0.zip"));
    }
}
