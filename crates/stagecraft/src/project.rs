//! Top-level entry point: map a requested stage to its class and run it.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde_json::json;
use stagecraft_config::{
    DefaultConfig, ResolvedConfig, load_config, load_config_from_file, load_package_meta, resolve,
};
use stagecraft_types::{Args, Params, StageName};
use thiserror::Error;

use crate::catalog::StageCatalog;
use crate::compiler::{Compiler, ToolCompiler};
use crate::console::{Logger, NullLogger, Style};
use crate::stage::{Stage, StageClass};

/// Pseudo-stage that dumps diagnostics instead of running anything.
pub const DEBUG_TARGET: &str = "debug";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProjectError {
    #[error("unknown stage: {0}")]
    UnknownStage(String),
}

/// A resolved project ready to run stages.
///
/// The configuration is resolved once and shared read-only with every
/// stage instance.
pub struct Project {
    root: PathBuf,
    config: ResolvedConfig,
    params: Params,
    catalog: StageCatalog,
    logger: Box<dyn Logger>,
    compiler: Box<dyn Compiler>,
}

impl Project {
    /// A project with the built-in catalog, a silent logger, and the
    /// external-tool compiler.
    pub fn new(root: impl Into<PathBuf>, config: ResolvedConfig, params: Params) -> Self {
        Self {
            root: root.into(),
            config,
            params,
            catalog: StageCatalog::builtin(),
            logger: Box::new(NullLogger),
            compiler: Box::new(ToolCompiler::new()),
        }
    }

    /// Load and resolve the configuration for `root`.
    ///
    /// `config_file` overrides config discovery. Package metadata is read
    /// from `root/package.json` when present. Classes are checked against
    /// `catalog`, which the project then uses.
    pub fn load(
        root: impl Into<PathBuf>,
        config_file: Option<&Path>,
        params: Params,
        catalog: StageCatalog,
    ) -> Result<Self> {
        let root = root.into();
        let user = match config_file {
            Some(path) => load_config_from_file(path)?,
            None => load_config(&root)?,
        };
        let package = load_package_meta(&root)?.unwrap_or_default();
        let config = resolve(&user, &DefaultConfig::from_package(package), &catalog)?;
        Ok(Self::new(root, config, params).with_catalog(catalog))
    }

    pub fn with_catalog(mut self, catalog: StageCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_logger(mut self, logger: impl Logger + 'static) -> Self {
        self.logger = Box::new(logger);
        self
    }

    pub fn with_compiler(mut self, compiler: impl Compiler + 'static) -> Self {
        self.compiler = Box::new(compiler);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn catalog(&self) -> &StageCatalog {
        &self.catalog
    }

    pub fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }

    pub fn compiler(&self) -> &dyn Compiler {
        self.compiler.as_ref()
    }

    /// Run `target`: a stage name or [`DEBUG_TARGET`].
    pub fn run(&self, target: &str) -> Result<()> {
        if target == DEBUG_TARGET {
            return self.dump();
        }
        let stage = target
            .parse::<StageName>()
            .map_err(|_| ProjectError::UnknownStage(target.to_string()))?;
        self.run_stage(stage)
    }

    /// Run `stage` with the top-level parameters. A disabled stage, or one
    /// whose class is not in the catalog, logs and succeeds.
    pub fn run_stage(&self, stage: StageName) -> Result<()> {
        let level = self.params.log_base_level;
        let Some((class, args)) = self.lookup(stage, level) else {
            if self.params.notice && !self.config.stage(stage).is_enabled() {
                self.logger.notice(
                    &format!("{stage} stage is disabled; nothing to do"),
                    level,
                    Style::default(),
                );
            }
            return Ok(());
        };
        Stage::new(self, stage, class, self.params.clone(), args).run()
    }

    /// The class and configured args for `stage`. `None` when the stage is
    /// disabled, or when its class is missing from the catalog, which is
    /// warned about at `level`.
    pub(crate) fn lookup(&self, stage: StageName, level: usize) -> Option<(&dyn StageClass, &Args)> {
        let entry = self.config.stage(stage);
        let (class_name, args) = (entry.class_name(stage)?, entry.args()?);
        let Some(class) = self.catalog.get(class_name) else {
            self.logger.warn(
                &format!("{stage} is configured with class {class_name}, which is not registered; skipping"),
                level,
                Style::default(),
            );
            return None;
        };
        Some((class, args))
    }

    fn dump(&self) -> Result<()> {
        let level = self.params.log_base_level;
        self.logger
            .inspect("root", &json!(self.root.display().to_string()), level);
        self.logger
            .inspect("config", &serde_json::to_value(&self.config)?, level);
        self.logger
            .inspect("params", &serde_json::to_value(&self.params)?, level);
        let classes: Vec<&str> = self.catalog.class_names().collect();
        self.logger.inspect("classes", &json!(classes), level);
        Ok(())
    }
}
