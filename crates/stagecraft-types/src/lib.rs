//! Core domain types for stagecraft.
//!
//! This crate provides the fundamental types shared by the stagecraft
//! crates: the fixed set of stage names, the run parameters handed to
//! every stage, sub-stage filter lists, and stage argument maps.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Name of one of the fixed pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageName {
    Compile,
    Build,
    Test,
    Document,
    Package,
    Release,
    Snapshot,
}

impl StageName {
    /// Every stage, in declaration order.
    pub const ALL: [StageName; 7] = [
        StageName::Compile,
        StageName::Build,
        StageName::Test,
        StageName::Document,
        StageName::Package,
        StageName::Release,
        StageName::Snapshot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Compile => "compile",
            StageName::Build => "build",
            StageName::Test => "test",
            StageName::Document => "document",
            StageName::Package => "package",
            StageName::Release => "release",
            StageName::Snapshot => "snapshot",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown stage `{0}` (expected one of: compile, build, test, document, package, release, snapshot)")]
pub struct ParseStageError(pub String);

impl FromStr for StageName {
    type Err = ParseStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StageName::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| ParseStageError(s.to_string()))
    }
}

/// Ordered list of sub-stage names used by `only`/`without` filtering.
///
/// An empty filter places no restriction on its own; what "empty" means is
/// decided by the caller (permissive for `only`, inert for `without`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(Vec<String>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a filter from raw CLI values. Each value may itself be a
    /// comma-separated list; blank entries are dropped.
    pub fn parse<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = values
            .into_iter()
            .flat_map(|value| {
                value
                    .as_ref()
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        Self(names)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for Filter {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Parameters for one stage invocation.
///
/// Parsed once from the command line. Nested stage runs receive a derived
/// copy from [`Params::nested`]; a `Params` value is never mutated after it
/// has been handed to a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Params {
    pub debug: bool,
    pub verbose: bool,
    pub notice: bool,
    pub progress: bool,
    pub dryrun: bool,
    pub building: bool,
    pub packaging: bool,
    pub releasing: bool,
    pub starting: bool,
    pub log_base_level: usize,
    pub only: Filter,
    pub without: Filter,
    /// `only-<stage>` values, applied when this run delegates to `<stage>`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub stage_only: BTreeMap<StageName, Filter>,
    /// `without-<stage>` values, applied when this run delegates to `<stage>`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub stage_without: BTreeMap<StageName, Filter>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            debug: false,
            verbose: false,
            notice: true,
            progress: false,
            dryrun: false,
            building: false,
            packaging: false,
            releasing: false,
            starting: false,
            log_base_level: 0,
            only: Filter::new(),
            without: Filter::new(),
            stage_only: BTreeMap::new(),
            stage_without: BTreeMap::new(),
        }
    }
}

impl Params {
    /// Top-level parameters for running `stage` as the requested command.
    pub fn for_command(stage: StageName) -> Self {
        Self::default().with_command(stage)
    }

    /// Mark these parameters as the top-level run of `stage`: sets the
    /// matching phase flag and applies the cascade.
    pub fn with_command(mut self, stage: StageName) -> Self {
        match stage {
            StageName::Build => self.building = true,
            StageName::Package => self.packaging = true,
            StageName::Release => self.releasing = true,
            _ => {}
        }
        self.starting = true;
        self.cascade()
    }

    /// Enforce `releasing ⇒ packaging ⇒ building`.
    pub fn cascade(mut self) -> Self {
        if self.releasing {
            self.packaging = true;
        }
        if self.packaging {
            self.building = true;
        }
        self
    }

    /// The `only-<stage>` filter, empty when unset.
    pub fn only_for(&self, stage: StageName) -> Filter {
        self.stage_only.get(&stage).cloned().unwrap_or_default()
    }

    /// The `without-<stage>` filter, empty when unset.
    pub fn without_for(&self, stage: StageName) -> Filter {
        self.stage_without.get(&stage).cloned().unwrap_or_default()
    }

    /// Derive the parameters for a nested run of `stage`.
    ///
    /// The log base level grows by `level_offset` and the sub-stage filters
    /// are re-scoped to this run's `only-<stage>`/`without-<stage>` values.
    pub fn nested(&self, stage: StageName, level_offset: usize) -> Params {
        Params {
            log_base_level: self.log_base_level + level_offset,
            only: self.only_for(stage),
            without: self.without_for(stage),
            starting: false,
            ..self.clone()
        }
    }
}

/// Stage arguments: a JSON object map.
pub type Args = Map<String, Value>;

/// Merge `overrides` into `base`, recursing into nested objects.
/// Non-object values (arrays included) are replaced wholesale.
pub fn deep_merge(base: &mut Args, overrides: &Args) {
    for (key, value) in overrides {
        match base.get_mut(key) {
            Some(existing) => merge_value(existing, value),
            None => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

fn merge_value(base: &mut Value, over: &Value) {
    match (base, over) {
        (Value::Object(base), Value::Object(over)) => deep_merge(base, over),
        (base, over) => *base = over.clone(),
    }
}

/// Merge `overrides` into `base` one level deep: top-level keys replace.
pub fn shallow_merge(base: &mut Args, overrides: &Args) {
    for (key, value) in overrides {
        base.insert(key.clone(), value.clone());
    }
}

/// Typed accessors for [`Args`].
pub trait ArgsExt {
    fn str_arg(&self, key: &str) -> Option<&str>;
    fn bool_arg(&self, key: &str) -> Option<bool>;
    fn strings_arg(&self, key: &str) -> Option<Vec<String>>;
    fn object_arg(&self, key: &str) -> Option<&Args>;
}

impl ArgsExt for Args {
    fn str_arg(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn bool_arg(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Accepts either a single string or an array of strings.
    fn strings_arg(&self, key: &str) -> Option<Vec<String>> {
        match self.get(key)? {
            Value::String(s) => Some(vec![s.clone()]),
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            ),
            _ => None,
        }
    }

    fn object_arg(&self, key: &str) -> Option<&Args> {
        self.get(key).and_then(Value::as_object)
    }
}
