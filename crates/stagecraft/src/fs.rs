//! File-system helper for stage bodies.
//!
//! [`Files`] is rooted at the project root. Relative paths resolve against
//! the root; in dry-run mode every mutating call reports what it would do
//! and leaves the disk untouched.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use walkdir::WalkDir;

/// What to do when a write target already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Overwrite it.
    #[default]
    Force,
    /// Write next to it as `<stem>.<n>.<ext>` with the first free `n`.
    Rename,
    /// Leave it alone.
    Keep,
}

/// Where a write went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Written {
    /// Written to this path.
    To(PathBuf),
    /// Target existed and the policy kept it.
    Kept(PathBuf),
    /// Dry run; would have written to this path.
    DryRun(PathBuf),
}

impl Written {
    pub fn path(&self) -> &Path {
        match self {
            Written::To(p) | Written::Kept(p) | Written::DryRun(p) => p,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Files {
    root: PathBuf,
    dryrun: bool,
}

impl Files {
    pub fn new(root: impl Into<PathBuf>, dryrun: bool) -> Self {
        Self {
            root: root.into(),
            dryrun,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_dryrun(&self) -> bool {
        self.dryrun
    }

    /// Absolute paths pass through; relative ones join the root.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// `path` relative to the root, or unchanged when it lies outside it.
    pub fn relative(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.resolve(path).exists()
    }

    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        self.resolve(path).is_dir()
    }

    pub fn is_file(&self, path: impl AsRef<Path>) -> bool {
        self.resolve(path).is_file()
    }

    /// Files matching `pattern` (relative to the root), sorted.
    pub fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let full = self.resolve(pattern);
        let full = full.to_string_lossy();
        let mut matches = Vec::new();
        for entry in glob::glob(&full).with_context(|| format!("invalid glob pattern: {pattern}"))? {
            let path = entry.with_context(|| format!("failed to read glob match for {pattern}"))?;
            if path.is_file() {
                matches.push(path);
            }
        }
        matches.sort();
        Ok(matches)
    }

    /// Every file below `dir`, sorted. A missing directory yields nothing.
    pub fn files_under(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = self.resolve(dir);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    pub fn read(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = self.resolve(path);
        std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))
    }

    pub fn write(&self, path: impl AsRef<Path>, contents: &str, policy: WritePolicy) -> Result<Written> {
        let path = self.resolve(path);
        let target = if path.exists() {
            match policy {
                WritePolicy::Force => path,
                WritePolicy::Keep => return Ok(Written::Kept(path)),
                WritePolicy::Rename => free_name(&path),
            }
        } else {
            path
        };

        if self.dryrun {
            return Ok(Written::DryRun(target));
        }
        ensure_parent(&target)?;
        std::fs::write(&target, contents)
            .with_context(|| format!("failed to write {}", target.display()))?;
        Ok(Written::To(target))
    }

    pub fn copy_file(&self, from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
        let (from, to) = (self.resolve(from), self.resolve(to));
        if same_path(&from, &to) {
            bail!("refusing to copy {} onto itself", from.display());
        }
        if self.dryrun {
            return Ok(());
        }
        ensure_parent(&to)?;
        std::fs::copy(&from, &to)
            .with_context(|| format!("failed to copy {} to {}", from.display(), to.display()))?;
        Ok(())
    }

    /// Copy the tree below `from` into `to`. Returns the number of files.
    pub fn copy_dir(&self, from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<usize> {
        let (from, to) = (self.resolve(from), self.resolve(to));
        if same_path(&from, &to) {
            bail!("refusing to copy {} onto itself", from.display());
        }
        let files = self.files_under(&from)?;
        for file in &files {
            let rel = file.strip_prefix(&from).with_context(|| {
                format!("{} is outside {}", file.display(), from.display())
            })?;
            self.copy_file(file, to.join(rel))?;
        }
        Ok(files.len())
    }

    /// Remove a file or a whole directory. Returns whether anything existed.
    pub fn delete(&self, path: impl AsRef<Path>) -> Result<bool> {
        let path = self.resolve(path);
        if !path.exists() {
            return Ok(false);
        }
        if self.dryrun {
            return Ok(true);
        }
        let removed = if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        removed.with_context(|| format!("failed to delete {}", path.display()))?;
        Ok(true)
    }
}

/// Lexically equal, or both exist and canonicalize to the same file.
fn same_path(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| p.components().next().is_some()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

fn free_name(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path.extension().map(|e| e.to_string_lossy().into_owned());
    (1..)
        .map(|n| {
            let name = match &ext {
                Some(ext) => format!("{stem}.{n}.{ext}"),
                None => format!("{stem}.{n}"),
            };
            path.with_file_name(name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Whether `path` stays below its starting point (no `..`, no root).
pub fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn resolve_and_relative_are_inverse() {
        let files = Files::new("/project", false);
        let full = files.resolve("dist/js/app.js");
        assert_eq!(full, PathBuf::from("/project/dist/js/app.js"));
        assert_eq!(files.relative(&full), PathBuf::from("dist/js/app.js"));
        assert_eq!(files.resolve("/abs"), PathBuf::from("/abs"));
        assert_eq!(files.relative("/elsewhere/x"), PathBuf::from("/elsewhere/x"));
    }

    #[test]
    fn glob_matches_relative_to_root() {
        let td = tempdir().expect("tempdir");
        let files = Files::new(td.path(), false);
        files.write("src/scss/a.scss", "a", WritePolicy::Force).expect("write");
        files.write("src/scss/nested/b.scss", "b", WritePolicy::Force).expect("write");
        files.write("src/scss/c.css", "c", WritePolicy::Force).expect("write");

        let found: Vec<_> = files
            .glob("src/scss/**/*.scss")
            .expect("glob")
            .iter()
            .map(|p| files.relative(p))
            .collect();
        assert_eq!(
            found,
            vec![
                PathBuf::from("src/scss/a.scss"),
                PathBuf::from("src/scss/nested/b.scss")
            ]
        );
    }

    #[test]
    fn write_policies() {
        let td = tempdir().expect("tempdir");
        let files = Files::new(td.path(), false);

        files.write("out.txt", "one", WritePolicy::Force).expect("write");
        let kept = files.write("out.txt", "two", WritePolicy::Keep).expect("write");
        assert!(matches!(kept, Written::Kept(_)));
        assert_eq!(files.read("out.txt").expect("read"), "one");

        let renamed = files.write("out.txt", "two", WritePolicy::Rename).expect("write");
        assert_eq!(renamed.path(), td.path().join("out.1.txt"));
        let renamed = files.write("out.txt", "three", WritePolicy::Rename).expect("write");
        assert_eq!(renamed.path(), td.path().join("out.2.txt"));

        files.write("out.txt", "four", WritePolicy::Force).expect("write");
        assert_eq!(files.read("out.txt").expect("read"), "four");
    }

    #[test]
    fn dryrun_leaves_disk_untouched() {
        let td = tempdir().expect("tempdir");
        std::fs::write(td.path().join("keep.txt"), "x").expect("write");
        let files = Files::new(td.path(), true);

        let written = files.write("new.txt", "x", WritePolicy::Force).expect("write");
        assert!(matches!(written, Written::DryRun(_)));
        assert!(!td.path().join("new.txt").exists());

        files.copy_file("keep.txt", "copy.txt").expect("copy");
        assert!(!td.path().join("copy.txt").exists());

        assert!(files.delete("keep.txt").expect("delete"));
        assert!(td.path().join("keep.txt").exists());
    }

    #[test]
    fn copy_dir_and_delete() {
        let td = tempdir().expect("tempdir");
        let files = Files::new(td.path(), false);
        files.write("src/files/a.txt", "a", WritePolicy::Force).expect("write");
        files.write("src/files/sub/b.txt", "b", WritePolicy::Force).expect("write");

        let copied = files.copy_dir("src/files", "dist/files").expect("copy");
        assert_eq!(copied, 2);
        assert_eq!(files.read("dist/files/sub/b.txt").expect("read"), "b");

        assert!(files.delete("dist").expect("delete"));
        assert!(!files.exists("dist"));
        assert!(!files.delete("dist").expect("delete"));
    }

    #[test]
    fn copying_onto_itself_is_refused() {
        let td = tempdir().expect("tempdir");
        let files = Files::new(td.path(), false);
        files.write("dist/js/index.js", "bundle", WritePolicy::Force).expect("write");

        let err = files
            .copy_dir("dist", td.path().join("dist"))
            .expect_err("same dir");
        assert!(err.to_string().contains("onto itself"));
        let err = files
            .copy_file("dist/js/index.js", "dist/js/../js/index.js")
            .expect_err("same file");
        assert!(err.to_string().contains("onto itself"));
        assert_eq!(files.read("dist/js/index.js").expect("read"), "bundle");
    }

    #[test]
    fn files_under_missing_dir_is_empty() {
        let td = tempdir().expect("tempdir");
        let files = Files::new(td.path(), false);
        assert!(files.files_under("nope").expect("walk").is_empty());
    }

    #[test]
    fn containment() {
        assert!(is_contained(Path::new("src/ts")));
        assert!(is_contained(Path::new("./README.md")));
        assert!(!is_contained(Path::new("../outside")));
        assert!(!is_contained(Path::new("/etc/passwd")));
    }
}
