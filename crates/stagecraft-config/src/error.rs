use stagecraft_types::StageName;
use thiserror::Error;

/// Errors surfaced while resolving a user configuration, before any stage runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("configuration has no `title` and none can be derived from package metadata")]
    MissingTitle,

    #[error("unknown stage `{0}` in [stages] (expected one of: compile, build, test, document, package, release, snapshot)")]
    UnknownStage(String),

    #[error("cannot interpret [stages] entry for `{stage}`: {found}")]
    UnrecognizedStageShape { stage: StageName, found: String },

    #[error("invalid `paths.{group}` value: {reason}")]
    InvalidPathGroup { group: &'static str, reason: String },
}
