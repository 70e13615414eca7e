//! Path groups and their default directory layout.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Placeholder replaced by the sub-directory key in templated path groups.
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Sub-directory keys every path group knows about.
pub const GROUP_KEYS: [&str; 4] = ["scss", "ts", "files", "docs"];

/// A directory group with one entry per known sub-directory key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathGroup {
    Dist,
    Src,
}

impl PathGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathGroup::Dist => "dist",
            PathGroup::Src => "src",
        }
    }

    /// Directory name used for `key` in the default layout.
    pub fn subdir(&self, key: &str) -> String {
        match (self, key) {
            (PathGroup::Dist, "scss") => "css".to_string(),
            (PathGroup::Dist, "ts") => "js".to_string(),
            (_, key) => key.to_string(),
        }
    }

    /// The default layout rooted at `base`.
    pub fn layout(&self, base: &str) -> BTreeMap<String, String> {
        let base = base.trim_end_matches('/');
        GROUP_KEYS
            .iter()
            .map(|key| (key.to_string(), format!("{base}/{}", self.subdir(key))))
            .collect()
    }
}

/// User-supplied value for a path group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathGroupInput {
    /// A base directory, or a template when it contains `{name}`.
    Base(String),
    /// Per-key overrides merged over the default mapping.
    Map(BTreeMap<String, String>),
    /// Computed per key. Only available programmatically.
    #[serde(skip)]
    Computed(fn(&str) -> String),
}

/// `paths` as written by the user; every field optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPaths {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dist: Option<PathGroupInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<PathGroupInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scripts: Option<String>,
}

/// Fully materialized paths, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPaths {
    pub dist: BTreeMap<String, String>,
    pub src: BTreeMap<String, String>,
    pub release: String,
    pub snapshot: String,
    pub scripts: String,
}

impl Default for ResolvedPaths {
    fn default() -> Self {
        Self {
            dist: PathGroup::Dist.layout("dist"),
            src: PathGroup::Src.layout("src"),
            release: "release".to_string(),
            snapshot: "snapshots".to_string(),
            scripts: "scripts".to_string(),
        }
    }
}

impl ResolvedPaths {
    pub fn dist(&self, key: &str) -> Option<&str> {
        self.dist.get(key).map(String::as_str)
    }

    pub fn src(&self, key: &str) -> Option<&str> {
        self.src.get(key).map(String::as_str)
    }

    /// Export in the user shape (every group as an explicit table).
    pub fn to_user_paths(&self) -> UserPaths {
        UserPaths {
            dist: Some(PathGroupInput::Map(self.dist.clone())),
            src: Some(PathGroupInput::Map(self.src.clone())),
            release: Some(self.release.clone()),
            snapshot: Some(self.snapshot.clone()),
            scripts: Some(self.scripts.clone()),
        }
    }
}

pub(crate) fn resolve_paths(
    user: &UserPaths,
    defaults: &ResolvedPaths,
) -> Result<ResolvedPaths, ConfigError> {
    Ok(ResolvedPaths {
        dist: resolve_group(PathGroup::Dist, user.dist.as_ref(), &defaults.dist)?,
        src: resolve_group(PathGroup::Src, user.src.as_ref(), &defaults.src)?,
        release: user.release.clone().unwrap_or_else(|| defaults.release.clone()),
        snapshot: user.snapshot.clone().unwrap_or_else(|| defaults.snapshot.clone()),
        scripts: user.scripts.clone().unwrap_or_else(|| defaults.scripts.clone()),
    })
}

fn resolve_group(
    group: PathGroup,
    input: Option<&PathGroupInput>,
    default: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, ConfigError> {
    let resolved = match input {
        None => default.clone(),
        Some(PathGroupInput::Base(base)) if base.trim().is_empty() => {
            return Err(ConfigError::InvalidPathGroup {
                group: group.as_str(),
                reason: "base directory is empty".to_string(),
            });
        }
        Some(PathGroupInput::Base(template)) if template.contains(NAME_PLACEHOLDER) => GROUP_KEYS
            .iter()
            .map(|key| (key.to_string(), template.replace(NAME_PLACEHOLDER, key)))
            .collect(),
        Some(PathGroupInput::Base(base)) => group.layout(base),
        Some(PathGroupInput::Map(overrides)) => {
            let mut merged = default.clone();
            merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
            merged
        }
        Some(PathGroupInput::Computed(f)) => GROUP_KEYS
            .iter()
            .map(|key| (key.to_string(), f(key)))
            .collect(),
    };
    Ok(resolved)
}
