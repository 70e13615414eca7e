//! Turning a partial user configuration into a fully resolved one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use stagecraft_types::{Args, StageName, deep_merge};

use crate::ConfigError;
use crate::paths::{ResolvedPaths, UserPaths, resolve_paths};
use crate::stages::{KnownClasses, StageEntry, resolve_entry};

/// Default display colour for the project title.
pub const DEFAULT_CLR: &str = "cyan";

/// Configuration as written by the user. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clr: Option<String>,
    pub paths: UserPaths,
    #[serde(skip_serializing_if = "Args::is_empty")]
    pub compiler: Args,
    /// Raw stage entries, keyed by stage name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub stages: BTreeMap<String, Value>,
}

/// Package metadata read from `package.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Defaults computed from package metadata, consulted wherever the user
/// configuration is silent.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultConfig {
    pub title: Option<String>,
    pub clr: String,
    pub paths: ResolvedPaths,
    pub compiler: Args,
    pub stages: BTreeMap<StageName, StageEntry>,
    pub package: PackageMeta,
}

impl DefaultConfig {
    pub fn from_package(package: PackageMeta) -> Self {
        let title = package
            .title
            .clone()
            .or_else(|| Some(package.name.clone()))
            .filter(|t| !t.trim().is_empty());

        let compiler = json!({
            "sass": { "style": "expanded", "source_map": true },
            "ts": {},
        });

        Self {
            title,
            clr: DEFAULT_CLR.to_string(),
            paths: ResolvedPaths::default(),
            compiler: compiler.as_object().cloned().unwrap_or_default(),
            stages: StageName::ALL
                .into_iter()
                .map(|stage| (stage, StageEntry::default_class()))
                .collect(),
            package,
        }
    }
}

impl Default for DefaultConfig {
    fn default() -> Self {
        Self::from_package(PackageMeta::default())
    }
}

/// The fully resolved configuration shared read-only by every stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    pub title: String,
    pub clr: String,
    pub paths: ResolvedPaths,
    pub compiler: Args,
    pub stages: BTreeMap<StageName, StageEntry>,
    pub package: PackageMeta,
}

static DISABLED: StageEntry = StageEntry::Disabled;

impl ResolvedConfig {
    /// The entry for `stage`; stages without an entry are disabled.
    pub fn stage(&self, stage: StageName) -> &StageEntry {
        self.stages.get(&stage).unwrap_or(&DISABLED)
    }

    /// Options for one sub-compiler (`sass`, `ts`, ...), empty when unset.
    pub fn compiler_options(&self, key: &str) -> Args {
        self.compiler
            .get(key)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    /// Export in the user shape. Resolving the export against the same
    /// defaults yields an identical configuration.
    pub fn to_user_config(&self) -> UserConfig {
        UserConfig {
            title: Some(self.title.clone()),
            clr: Some(self.clr.clone()),
            paths: self.paths.to_user_paths(),
            compiler: self.compiler.clone(),
            stages: self
                .stages
                .iter()
                .map(|(stage, entry)| (stage.as_str().to_string(), entry.to_user_value()))
                .collect(),
        }
    }
}

/// Resolve `user` against `defaults`.
///
/// Missing optional fields fall back to the defaults at every level. Fails
/// when no title can be found, when `[stages]` names an unknown stage, or
/// when a stage entry has a shape that cannot be interpreted.
pub fn resolve(
    user: &UserConfig,
    defaults: &DefaultConfig,
    classes: &dyn KnownClasses,
) -> Result<ResolvedConfig, ConfigError> {
    let title = user
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| defaults.title.clone())
        .ok_or(ConfigError::MissingTitle)?;

    let clr = user.clr.clone().unwrap_or_else(|| defaults.clr.clone());
    let paths = resolve_paths(&user.paths, &defaults.paths)?;

    let mut compiler = defaults.compiler.clone();
    deep_merge(&mut compiler, &user.compiler);

    let mut raw = BTreeMap::new();
    for (key, value) in &user.stages {
        let stage: StageName = key
            .parse()
            .map_err(|_| ConfigError::UnknownStage(key.clone()))?;
        raw.insert(stage, value);
    }

    let mut stages = BTreeMap::new();
    for stage in StageName::ALL {
        let default = defaults.stages.get(&stage).unwrap_or(&DISABLED);
        let entry = resolve_entry(stage, raw.get(&stage).copied(), default, classes)?;
        stages.insert(stage, entry);
    }

    Ok(ResolvedConfig {
        title,
        clr,
        paths,
        compiler,
        stages,
        package: defaults.package.clone(),
    })
}
