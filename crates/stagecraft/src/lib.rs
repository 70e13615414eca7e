//! # Stagecraft
//!
//! A stage orchestration engine for front-end package pipelines.
//!
//! A project declares a fixed set of named stages (`compile`, `build`,
//! `test`, `document`, `package`, `release`, `snapshot`). Each stage is an
//! instance of a [`StageClass`]: an ordered table of sub-stages that run
//! one after another. Sub-stages may delegate to other stages, so
//! `release` runs `package`, which runs `build`, which runs `compile`.
//!
//! ## Pipeline
//!
//! 1. Configuration is loaded and resolved once
//!    ([`stagecraft_config::resolve`]); every stage entry is normalized to
//!    a [`StageEntry`].
//! 2. [`Project::run`] maps the requested stage to its class. Disabled
//!    stages are a logged no-op.
//! 3. [`Stage::run`] walks the sub-stage table in declared order, gating
//!    each entry through the [`SubStageFilter`] (`--only` / `--without`).
//! 4. [`Stage::run_stage`] starts a child stage with re-scoped
//!    [`Params`]: one level deeper, filtered by `--only-<stage>` /
//!    `--without-<stage>`.
//!
//! Failures propagate unchanged; the first failing sub-stage aborts every
//! enclosing stage.
//!
//! ## Example
//!
//! ```ignore
//! use stagecraft::{MemoryLogger, Params, Project, StageCatalog, StageName};
//!
//! let logger = MemoryLogger::new();
//! let project = Project::load(".", None, Params::for_command(StageName::Build), StageCatalog::builtin())?
//!     .with_logger(logger.clone());
//! project.run("build")?;
//! ```

pub mod catalog;
pub mod compiler;
pub mod console;
pub mod filter;
pub mod fs;
pub mod project;
pub mod stage;
pub mod stages;

pub use catalog::StageCatalog;
pub use compiler::{Compiler, StyleOptions, ToolCompiler};
pub use console::{LogEntry, LogKind, Logger, MemoryLogger, NullLogger, Style};
pub use filter::{Inclusion, SubStageFilter};
pub use fs::{Files, WritePolicy, Written};
pub use project::{DEBUG_TARGET, Project, ProjectError};
pub use stage::{Handler, Stage, StageClass, SubStage};

pub use stagecraft_config::{ConfigError, ResolvedConfig, StageEntry};
pub use stagecraft_types::{Args, Filter, Params, StageName};
