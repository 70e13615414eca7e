use std::path::Path;

use anyhow::{Result, bail};
use serde_json::json;
use stagecraft_git::{commit_all, create_tag, github_release, is_git_repo, push_with_tag, release_context};
use stagecraft_process::command_exists;
use stagecraft_types::{Args, ArgsExt, StageName};

use super::package::archive_path;
use super::{object, package_version};
use crate::stage::{Stage, StageClass, SubStage};

/// Packages, commits, tags, and publishes a GitHub release.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseStage;

impl StageClass for ReleaseStage {
    fn class_name(&self) -> &str {
        "release"
    }

    fn clr(&self) -> &str {
        "red"
    }

    fn default_args(&self) -> Args {
        object(json!({ "push": false, "remote": "origin", "github": true }))
    }

    fn sub_stages(&self) -> Vec<SubStage<'_>> {
        vec![
            SubStage::new("package", |stage: &Stage<'_>| stage.run_stage(StageName::Package, 1)),
            SubStage::new("commit", commit),
            SubStage::new("tag", tag),
            SubStage::new("github", github),
        ]
    }
}

fn release_tag(stage: &Stage<'_>) -> Result<String> {
    Ok(format!("v{}", package_version(stage.config())?))
}

fn commit(stage: &Stage<'_>) -> Result<()> {
    let root = stage.root();
    let tag = release_tag(stage)?;
    if !is_git_repo(root) {
        bail!("{} is not a git repository", root.display());
    }

    let context = release_context(root);
    stage.verbose(
        &format!(
            "releasing from {} at {}",
            context.branch.as_deref().unwrap_or("detached HEAD"),
            context.short_commit().unwrap_or("an empty history")
        ),
        2,
    );

    let message = format!("Release {tag}");
    if stage.is_dryrun() {
        stage.notice(&format!("would commit `{message}`"), 2);
        return Ok(());
    }
    if commit_all(root, &message)? {
        stage.progress(&message, 2);
    } else {
        stage.verbose("working tree clean; nothing to commit", 2);
    }
    Ok(())
}

fn tag(stage: &Stage<'_>) -> Result<()> {
    let root = stage.root();
    let tag = release_tag(stage)?;
    let push = stage.args().bool_arg("push").unwrap_or(false);
    let remote = stage.args().str_arg("remote").unwrap_or("origin");

    if stage.is_dryrun() {
        stage.notice(&format!("would tag {tag}"), 2);
        if push {
            stage.notice(&format!("would push {tag} to {remote}"), 2);
        }
        return Ok(());
    }

    create_tag(root, &tag, &format!("Release {tag}"))?;
    stage.progress(&tag, 2);
    if push {
        push_with_tag(root, remote, &tag)?;
        stage.progress(&format!("pushed {tag} to {remote}"), 2);
    }
    Ok(())
}

fn github(stage: &Stage<'_>) -> Result<()> {
    if stage.args().bool_arg("github") == Some(false) {
        stage.verbose("GitHub release disabled", 2);
        return Ok(());
    }
    if !command_exists("gh") {
        stage.warn("gh is not installed; skipping GitHub release", 2);
        return Ok(());
    }

    let tag = release_tag(stage)?;
    let title = format!("{} {tag}", stage.config().title);
    let archive = archive_path(stage)?;
    let assets: Vec<&Path> = if archive.is_file() {
        vec![archive.as_path()]
    } else {
        stage.warn(&format!("{} not found; releasing without assets", archive.display()), 2);
        Vec::new()
    };

    if stage.is_dryrun() {
        stage.notice(&format!("would publish GitHub release {tag}"), 2);
        return Ok(());
    }
    github_release(stage.root(), &tag, &title, &assets)?;
    stage.progress(&format!("published GitHub release {tag}"), 2);
    Ok(())
}
