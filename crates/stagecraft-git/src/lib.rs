//! Git operations for stagecraft.
//!
//! This crate provides the version-control steps of a release: cleanliness
//! checks, committing release changes, tagging, and publishing a GitHub
//! release through the `gh` CLI.
//!
//! # Example
//!
//! ```
//! use stagecraft_git::{ReleaseContext, is_git_repo, release_context};
//! use std::path::Path;
//!
//! if is_git_repo(Path::new(".")) {
//!     let context = release_context(Path::new("."));
//!     if let Some(branch) = context.branch {
//!         println!("Releasing from: {}", branch);
//!     }
//! }
//! ```

use std::path::Path;
use std::process::{Command, Output};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Repository state captured before a release.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseContext {
    /// Current commit hash
    pub commit: Option<String>,
    /// Current branch name
    pub branch: Option<String>,
    /// Whether the working tree has uncommitted changes
    pub dirty: Option<bool>,
}

impl ReleaseContext {
    /// Get a short commit hash (first 7 characters)
    pub fn short_commit(&self) -> Option<&str> {
        self.commit.as_ref().map(|c| {
            if c.len() > 7 {
                &c[..7]
            } else {
                c.as_str()
            }
        })
    }
}

fn git(path: &Path, args: &[&str]) -> Result<Output> {
    Command::new("git")
        .args(args)
        .current_dir(path)
        .output()
        .with_context(|| format!("failed to run git {}", args.join(" ")))
}

fn git_checked(path: &Path, args: &[&str]) -> Result<String> {
    let output = git(path, args)?;
    if !output.status.success() {
        bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Check if we're inside a git repository
pub fn is_git_repo(path: &Path) -> bool {
    git(path, &["rev-parse", "--is-inside-work-tree"])
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Check if the git working tree is clean (no uncommitted changes)
pub fn is_git_clean(path: &Path) -> Result<bool> {
    let status = git_checked(path, &["status", "--porcelain"])?;
    Ok(status.is_empty())
}

/// Get the current git commit hash
pub fn commit_hash(path: &Path) -> Result<String> {
    git_checked(path, &["rev-parse", "HEAD"])
}

/// Get the current branch name; `None` on a detached HEAD.
pub fn current_branch(path: &Path) -> Result<Option<String>> {
    let output = git(path, &["rev-parse", "--abbrev-ref", "HEAD"])?;
    if !output.status.success() {
        return Ok(None);
    }

    let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if branch == "HEAD" {
        return Ok(None);
    }

    Ok(Some(branch))
}

/// Capture the repository state for release logs.
pub fn release_context(path: &Path) -> ReleaseContext {
    ReleaseContext {
        commit: commit_hash(path).ok(),
        branch: current_branch(path).ok().flatten(),
        dirty: is_git_clean(path).ok().map(|clean| !clean),
    }
}

/// Check whether `tag` already exists.
pub fn tag_exists(path: &Path, tag: &str) -> Result<bool> {
    let tags = git_checked(path, &["tag", "--list", tag])?;
    Ok(tags.lines().any(|line| line.trim() == tag))
}

/// Stage everything and commit it with `message`.
///
/// Returns `false` without committing when the tree is already clean.
pub fn commit_all(path: &Path, message: &str) -> Result<bool> {
    if is_git_clean(path)? {
        return Ok(false);
    }
    git_checked(path, &["add", "--all"])?;
    git_checked(path, &["commit", "-m", message])?;
    Ok(true)
}

/// Create an annotated tag at HEAD. Fails when the tag already exists.
pub fn create_tag(path: &Path, tag: &str, message: &str) -> Result<()> {
    if tag_exists(path, tag)? {
        bail!("tag {tag} already exists");
    }
    git_checked(path, &["tag", "-a", tag, "-m", message])?;
    Ok(())
}

/// Push the current branch and `tag` to `remote`.
pub fn push_with_tag(path: &Path, remote: &str, tag: &str) -> Result<()> {
    git_checked(path, &["push", remote, "HEAD"])?;
    git_checked(path, &["push", remote, tag])?;
    Ok(())
}

/// Publish a GitHub release for `tag` with the given assets via `gh`.
pub fn github_release(path: &Path, tag: &str, title: &str, assets: &[&Path]) -> Result<()> {
    let mut args = vec![
        "release".to_string(),
        "create".to_string(),
        tag.to_string(),
        "--title".to_string(),
        title.to_string(),
        "--generate-notes".to_string(),
    ];
    args.extend(assets.iter().map(|a| a.display().to_string()));

    let output = Command::new("gh")
        .args(&args)
        .current_dir(path)
        .output()
        .context("failed to run gh release create")?;

    if !output.status.success() {
        bail!(
            "gh release create failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use tempfile::tempdir;

    fn init_git_repo(dir: &Path) {
        for args in [
            vec!["init"],
            vec!["config", "user.email", "test@example.com"],
            vec!["config", "user.name", "Test User"],
            vec!["config", "commit.gpgsign", "false"],
            vec!["config", "tag.gpgsign", "false"],
        ] {
            Command::new("git")
                .args(&args)
                .current_dir(dir)
                .output()
                .expect("git setup");
        }
    }

    fn make_commit(dir: &Path, msg: &str) {
        Command::new("git")
            .args(["commit", "--allow-empty", "-m", msg])
            .current_dir(dir)
            .output()
            .expect("git commit");
    }

    #[test]
    fn is_git_repo_detects_repo() {
        let td = tempdir().expect("tempdir");
        init_git_repo(td.path());

        assert!(is_git_repo(td.path()));
    }

    #[test]
    fn is_git_repo_returns_false_for_non_repo() {
        let td = tempdir().expect("tempdir");
        assert!(!is_git_repo(td.path()));
    }

    #[test]
    fn commit_all_skips_clean_tree() {
        let td = tempdir().expect("tempdir");
        init_git_repo(td.path());
        make_commit(td.path(), "initial");

        assert!(!commit_all(td.path(), "nothing").expect("commit"));
    }

    #[test]
    fn commit_all_commits_changes() {
        let td = tempdir().expect("tempdir");
        init_git_repo(td.path());
        make_commit(td.path(), "initial");
        std::fs::write(td.path().join("dist.js"), "x").expect("write");

        assert!(!is_git_clean(td.path()).expect("status"));
        assert!(commit_all(td.path(), "Release v1.0.0").expect("commit"));
        assert!(is_git_clean(td.path()).expect("status"));
    }

    #[test]
    fn create_tag_refuses_duplicates() {
        let td = tempdir().expect("tempdir");
        init_git_repo(td.path());
        make_commit(td.path(), "initial");

        create_tag(td.path(), "v1.0.0", "Release v1.0.0").expect("tag");
        assert!(tag_exists(td.path(), "v1.0.0").expect("tag list"));
        assert!(!tag_exists(td.path(), "v1.0").expect("tag list"));

        let err = create_tag(td.path(), "v1.0.0", "again").expect_err("duplicate");
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn release_context_populates_fields() {
        let td = tempdir().expect("tempdir");
        init_git_repo(td.path());
        make_commit(td.path(), "test");

        let context = release_context(td.path());
        assert_eq!(context.commit.as_ref().map(String::len), Some(40));
        assert_eq!(context.dirty, Some(false));
        assert_eq!(context.short_commit().map(str::len), Some(7));
    }

    #[test]
    fn short_commit_truncates() {
        let context = ReleaseContext {
            commit: Some("0123456789abcdef0123456789abcdef01234567".to_string()),
            ..ReleaseContext::default()
        };

        assert_eq!(context.short_commit(), Some("0123456"));
    }
}
