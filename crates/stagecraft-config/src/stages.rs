//! Normalization of `[stages]` entries.
//!
//! User entries come in several shapes (`false`, `true`, an args table, a
//! class name, or a `[class, args]` pair). They are collapsed into a
//! [`StageEntry`] here and never travel further in their raw form.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;
use stagecraft_types::{Args, StageName, deep_merge};

use crate::ConfigError;

/// A normalized stage declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageEntry {
    Disabled,
    /// The built-in class registered under the stage's own name.
    Default { args: Args },
    /// A class registered under `class`.
    Custom { class: String, args: Args },
}

impl StageEntry {
    pub fn default_class() -> Self {
        StageEntry::Default { args: Args::new() }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, StageEntry::Disabled)
    }

    pub fn args(&self) -> Option<&Args> {
        match self {
            StageEntry::Disabled => None,
            StageEntry::Default { args } | StageEntry::Custom { args, .. } => Some(args),
        }
    }

    /// Catalog key of the class that runs `stage`, if enabled.
    pub fn class_name<'a>(&'a self, stage: StageName) -> Option<&'a str> {
        match self {
            StageEntry::Disabled => None,
            StageEntry::Default { .. } => Some(stage.as_str()),
            StageEntry::Custom { class, .. } => Some(class),
        }
    }

    /// Same class as `self`, with `args` in place of its arguments.
    /// A disabled entry falls back to the default class.
    fn with_args(&self, args: Args) -> StageEntry {
        match self {
            StageEntry::Custom { class, .. } => StageEntry::Custom {
                class: class.clone(),
                args,
            },
            StageEntry::Default { .. } | StageEntry::Disabled => StageEntry::Default { args },
        }
    }

    /// Export in the user shape; resolving the export yields `self` again.
    pub fn to_user_value(&self) -> Value {
        match self {
            StageEntry::Disabled => Value::Bool(false),
            StageEntry::Default { args } if args.is_empty() => Value::Bool(true),
            StageEntry::Default { args } => Value::Object(args.clone()),
            StageEntry::Custom { class, args } => Value::Array(vec![
                Value::String(class.clone()),
                Value::Object(args.clone()),
            ]),
        }
    }
}

/// The set of stage class names that can be instantiated.
pub trait KnownClasses {
    fn knows(&self, class: &str) -> bool;
}

impl KnownClasses for BTreeSet<String> {
    fn knows(&self, class: &str) -> bool {
        self.contains(class)
    }
}

impl KnownClasses for [&str] {
    fn knows(&self, class: &str) -> bool {
        self.iter().any(|known| *known == class)
    }
}

impl<const N: usize> KnownClasses for [&str; N] {
    fn knows(&self, class: &str) -> bool {
        self.iter().any(|known| *known == class)
    }
}

pub(crate) fn resolve_entry(
    stage: StageName,
    user: Option<&Value>,
    default: &StageEntry,
    classes: &dyn KnownClasses,
) -> Result<StageEntry, ConfigError> {
    let base_args = || default.args().cloned().unwrap_or_default();

    match user {
        None | Some(Value::Null) => Ok(default.clone()),
        Some(Value::Bool(false)) => Ok(StageEntry::Disabled),
        Some(Value::Bool(true)) => Ok(default.with_args(Args::new())),
        Some(Value::Object(overrides)) => {
            let mut args = base_args();
            deep_merge(&mut args, overrides);
            Ok(default.with_args(args))
        }
        Some(Value::String(class)) if classes.knows(class) => Ok(StageEntry::Custom {
            class: class.clone(),
            args: Args::new(),
        }),
        Some(Value::Array(pair)) if pair.len() == 2 => {
            let mut args = base_args();
            if let Some(overrides) = pair[1].as_object() {
                deep_merge(&mut args, overrides);
            }
            match pair[0].as_str().filter(|class| classes.knows(class)) {
                Some(class) => Ok(StageEntry::Custom {
                    class: class.to_string(),
                    args,
                }),
                None => Ok(default.with_args(args)),
            }
        }
        Some(other) => Err(ConfigError::UnrecognizedStageShape {
            stage,
            found: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CLASSES: [&str; 2] = ["compile", "fast-compile"];

    fn args(value: Value) -> Args {
        value.as_object().cloned().expect("object")
    }

    fn resolve(user: Value, default: &StageEntry) -> Result<StageEntry, ConfigError> {
        resolve_entry(StageName::Compile, Some(&user), default, &CLASSES)
    }

    #[test]
    fn absent_inherits_default() {
        let default = StageEntry::Default {
            args: args(json!({"tsconfig": "tsconfig.build.json"})),
        };
        let entry = resolve_entry(StageName::Compile, None, &default, &CLASSES).expect("resolve");
        assert_eq!(entry, default);
        let entry = resolve(Value::Null, &default).expect("resolve");
        assert_eq!(entry, default);
    }

    #[test]
    fn false_disables() {
        let entry = resolve(json!(false), &StageEntry::default_class()).expect("resolve");
        assert_eq!(entry, StageEntry::Disabled);
        assert!(!entry.is_enabled());
    }

    #[test]
    fn true_uses_default_class_with_empty_args() {
        let default = StageEntry::Default {
            args: args(json!({"a": 1})),
        };
        let entry = resolve(json!(true), &default).expect("resolve");
        assert_eq!(entry, StageEntry::default_class());
    }

    #[test]
    fn table_overrides_default_args() {
        let default = StageEntry::Default {
            args: args(json!({"a": 1, "nested": {"x": 1, "y": 2}})),
        };
        let entry = resolve(json!({"nested": {"y": 3}}), &default).expect("resolve");
        assert_eq!(
            entry,
            StageEntry::Default {
                args: args(json!({"a": 1, "nested": {"x": 1, "y": 3}}))
            }
        );
    }

    #[test]
    fn empty_table_matches_absent_args() {
        let default = StageEntry::default_class();
        let from_table = resolve(json!({}), &default).expect("resolve");
        let from_true = resolve(json!(true), &default).expect("resolve");
        assert_eq!(from_table, from_true);
    }

    #[test]
    fn pair_with_known_class_adopts_it() {
        let entry = resolve(json!(["fast-compile", {"minify": true}]), &StageEntry::default_class())
            .expect("resolve");
        assert_eq!(
            entry,
            StageEntry::Custom {
                class: "fast-compile".to_string(),
                args: args(json!({"minify": true})),
            }
        );
        assert_eq!(entry.class_name(StageName::Compile), Some("fast-compile"));
    }

    #[test]
    fn pair_with_unknown_class_keeps_default_class() {
        let entry = resolve(json!(["no-such-class", {"minify": true}]), &StageEntry::default_class())
            .expect("resolve");
        assert_eq!(
            entry,
            StageEntry::Default {
                args: args(json!({"minify": true}))
            }
        );
    }

    #[test]
    fn pair_with_non_object_args_keeps_default_args() {
        let default = StageEntry::Default {
            args: args(json!({"a": 1})),
        };
        let entry = resolve(json!(["fast-compile", 7]), &default).expect("resolve");
        assert_eq!(
            entry,
            StageEntry::Custom {
                class: "fast-compile".to_string(),
                args: args(json!({"a": 1})),
            }
        );
    }

    #[test]
    fn bare_known_class_name_is_adopted() {
        let entry = resolve(json!("fast-compile"), &StageEntry::default_class()).expect("resolve");
        assert_eq!(
            entry,
            StageEntry::Custom {
                class: "fast-compile".to_string(),
                args: Args::new(),
            }
        );
    }

    #[test]
    fn unrecognized_shapes_are_errors() {
        for value in [json!("no-such-class"), json!(3), json!(["a"]), json!(["a", {}, {}])] {
            let err = resolve(value.clone(), &StageEntry::default_class())
                .expect_err("unrecognized shape");
            assert_eq!(
                err,
                ConfigError::UnrecognizedStageShape {
                    stage: StageName::Compile,
                    found: value.to_string(),
                }
            );
        }
    }

    #[test]
    fn custom_default_keeps_its_class_for_table_overrides() {
        let default = StageEntry::Custom {
            class: "fast-compile".to_string(),
            args: Args::new(),
        };
        let entry = resolve(json!({"minify": false}), &default).expect("resolve");
        assert_eq!(entry.class_name(StageName::Compile), Some("fast-compile"));
    }

    #[test]
    fn user_value_export_roundtrips() {
        let entries = [
            StageEntry::Disabled,
            StageEntry::default_class(),
            StageEntry::Default {
                args: args(json!({"a": {"b": 1}})),
            },
            StageEntry::Custom {
                class: "fast-compile".to_string(),
                args: args(json!({"minify": true})),
            },
        ];
        for entry in entries {
            let again = resolve(entry.to_user_value(), &StageEntry::default_class()).expect("resolve");
            assert_eq!(again, entry);
        }
    }
}
