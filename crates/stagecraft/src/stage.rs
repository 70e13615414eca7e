//! The stage lifecycle.
//!
//! A [`StageClass`] declares an ordered table of sub-stages. A [`Stage`] is
//! one run of a class: it owns its parameters and args, walks the table in
//! declared order, and runs each included sub-stage to completion before
//! the next. `Stage::run` consumes the stage, so an instance runs once.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use stagecraft_config::ResolvedConfig;
use stagecraft_types::{Args, Params, StageName, deep_merge, shallow_merge};

use crate::compiler::Compiler;
use crate::console::{Logger, Style};
use crate::filter::{Inclusion, SubStageFilter};
use crate::fs::Files;
use crate::project::Project;

/// Body of one sub-stage.
pub type Handler<'a> = Box<dyn Fn(&Stage<'_>) -> Result<()> + 'a>;

/// One entry of a stage's sub-stage table.
pub struct SubStage<'a> {
    name: &'static str,
    handler: Option<Handler<'a>>,
}

impl<'a> SubStage<'a> {
    pub fn new(name: &'static str, handler: impl Fn(&Stage<'_>) -> Result<()> + 'a) -> Self {
        Self {
            name,
            handler: Some(Box::new(handler)),
        }
    }

    /// A declared sub-stage without a body. It is always skipped.
    pub fn unbound(name: &'static str) -> Self {
        Self {
            name,
            handler: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_bound(&self) -> bool {
        self.handler.is_some()
    }
}

impl std::fmt::Debug for SubStage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubStage")
            .field("name", &self.name)
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// A kind of stage that can be registered in a [`crate::StageCatalog`].
pub trait StageClass {
    /// Catalog key. Built-in classes use their stage name.
    fn class_name(&self) -> &str;

    /// Colour used to tag this stage's messages.
    fn clr(&self) -> &str {
        "white"
    }

    /// Args the configured args are deep-merged over.
    fn default_args(&self) -> Args {
        Args::new()
    }

    /// Sub-stages in execution order.
    fn sub_stages(&self) -> Vec<SubStage<'_>>;
}

/// One run of a stage class.
pub struct Stage<'p> {
    name: StageName,
    class: &'p dyn StageClass,
    project: &'p Project,
    params: Params,
    args: Args,
}

impl<'p> Stage<'p> {
    pub(crate) fn new(
        project: &'p Project,
        name: StageName,
        class: &'p dyn StageClass,
        params: Params,
        supplied: &Args,
    ) -> Self {
        let mut args = class.default_args();
        deep_merge(&mut args, supplied);
        Self {
            name,
            class,
            project,
            params,
            args,
        }
    }

    pub fn name(&self) -> StageName {
        self.name
    }

    pub fn class_name(&self) -> &str {
        self.class.class_name()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn args(&self) -> &Args {
        &self.args
    }

    pub fn config(&self) -> &'p ResolvedConfig {
        self.project.config()
    }

    pub fn project(&self) -> &'p Project {
        self.project
    }

    pub fn root(&self) -> &'p Path {
        self.project.root()
    }

    pub fn compiler(&self) -> &'p dyn Compiler {
        self.project.compiler()
    }

    pub fn is_dryrun(&self) -> bool {
        self.params.dryrun
    }

    /// File helper rooted at the project, honouring `--dryrun`.
    pub fn files(&self) -> Files {
        Files::new(self.root(), self.params.dryrun)
    }

    /// Absolute `paths.dist.<key>`.
    pub fn dist_dir(&self, key: &str) -> Option<PathBuf> {
        self.config().paths.dist(key).map(|p| self.root().join(p))
    }

    /// Absolute `paths.src.<key>`.
    pub fn src_dir(&self, key: &str) -> Option<PathBuf> {
        self.config().paths.src(key).map(|p| self.root().join(p))
    }

    fn style(&self) -> Style<'_> {
        Style::tagged(self.name.as_str(), self.class.clr())
    }

    fn logger(&self) -> &'p dyn Logger {
        self.project.logger()
    }

    fn level(&self, level: usize) -> usize {
        self.params.log_base_level + level
    }

    pub fn progress(&self, msg: &str, level: usize) {
        self.logger().progress(msg, self.level(level), self.style());
    }

    pub fn verbose(&self, msg: &str, level: usize) {
        self.logger().verbose(msg, self.level(level), self.style());
    }

    pub fn notice(&self, msg: &str, level: usize) {
        if self.params.notice {
            self.logger().notice(msg, self.level(level), self.style());
        }
    }

    pub fn debug(&self, msg: &str, level: usize) {
        self.logger().debug(msg, self.level(level), self.style());
    }

    pub fn warn(&self, msg: &str, level: usize) {
        self.logger().warn(msg, self.level(level), self.style());
    }

    fn describe(&self) -> String {
        let class = self.class.class_name();
        if class == self.name.as_str() {
            self.name.to_string()
        } else {
            format!("{} ({class})", self.name)
        }
    }

    /// Run every included sub-stage in declared order.
    ///
    /// The first failing sub-stage aborts the run; its error is returned
    /// with the stage and sub-stage names as context.
    pub fn run(self) -> Result<()> {
        self.notice(&format!("Starting {}", self.describe()), 0);

        let table = self.class.sub_stages();
        let declared: Vec<&str> = table.iter().map(SubStage::name).collect();
        let filter = SubStageFilter::new(&self.params.only, &self.params.without);

        for sub in &table {
            match (filter.decide(&declared, sub.name, sub.is_bound()), &sub.handler) {
                (Inclusion::Included, Some(handler)) => {
                    self.progress(sub.name, 1);
                    handler(&self).with_context(|| format!("{}:{} failed", self.name, sub.name))?;
                }
                (decision, _) => {
                    self.verbose(&format!("skipping {}: {}", sub.name, decision.reason()), 1);
                }
            }
        }

        self.notice(&format!("Finished {}", self.describe()), 0);
        Ok(())
    }

    /// Run the stage configured under `name` as a child of this one.
    ///
    /// The child gets this stage's args with the target's configured args
    /// shallow-merged on top, and parameters from [`Params::nested`]. A
    /// target without a configured class is skipped.
    pub fn run_stage(&self, name: StageName, level_offset: usize) -> Result<()> {
        let Some((class, configured)) = self.project.lookup(name, self.level(level_offset)) else {
            self.verbose(&format!("no {name} stage configured; skipping"), level_offset);
            return Ok(());
        };

        let mut args = self.args.clone();
        shallow_merge(&mut args, configured);
        let params = self.params.nested(name, level_offset);
        Stage::new(self.project, name, class, params, &args).run()
    }
}
