use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use stagecraft::{DEBUG_TARGET, Project, StageCatalog};
use stagecraft_types::{Filter, Params, StageName};

mod console;

use console::ConsoleLogger;

#[derive(Parser, Debug)]
#[command(name = "stagecraft", version)]
#[command(about = "Run the stages of a front-end package pipeline")]
struct Cli {
    /// Project root (where package.json lives)
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Configuration file. Defaults to the nearest .stagecraft.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print debug messages.
    #[arg(long, global = true)]
    debug: bool,

    /// Print every decision, including skipped sub-stages.
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress stage start/finish notices.
    #[arg(long = "no-notice", global = true)]
    no_notice: bool,

    /// Print sub-stage progress.
    #[arg(long, global = true)]
    progress: bool,

    /// Log what would happen without writing, committing, or publishing.
    #[arg(long, global = true)]
    dryrun: bool,

    /// Mark the run as part of a build.
    #[arg(long, global = true)]
    building: bool,

    /// Mark the run as part of packaging (implies --building).
    #[arg(long, global = true)]
    packaging: bool,

    /// Mark the run as part of a release (implies --packaging).
    #[arg(long, global = true)]
    releasing: bool,

    /// Indentation level of the outermost stage.
    #[arg(long, global = true, default_value_t = 0)]
    log_base_level: usize,

    /// Run only these sub-stages (repeatable, comma-separated).
    #[arg(long, global = true, value_name = "NAMES")]
    only: Vec<String>,

    /// Skip these sub-stages (repeatable, comma-separated). Wins over --only.
    #[arg(long, global = true, value_name = "NAMES")]
    without: Vec<String>,

    /// --only for the compile stage when it runs nested.
    #[arg(long, global = true, value_name = "NAMES")]
    only_compile: Vec<String>,
    /// --without for the compile stage when it runs nested.
    #[arg(long, global = true, value_name = "NAMES")]
    without_compile: Vec<String>,
    /// --only for the build stage when it runs nested.
    #[arg(long, global = true, value_name = "NAMES")]
    only_build: Vec<String>,
    /// --without for the build stage when it runs nested.
    #[arg(long, global = true, value_name = "NAMES")]
    without_build: Vec<String>,
    /// --only for the test stage when it runs nested.
    #[arg(long, global = true, value_name = "NAMES")]
    only_test: Vec<String>,
    /// --without for the test stage when it runs nested.
    #[arg(long, global = true, value_name = "NAMES")]
    without_test: Vec<String>,
    /// --only for the document stage when it runs nested.
    #[arg(long, global = true, value_name = "NAMES")]
    only_document: Vec<String>,
    /// --without for the document stage when it runs nested.
    #[arg(long, global = true, value_name = "NAMES")]
    without_document: Vec<String>,
    /// --only for the package stage when it runs nested.
    #[arg(long, global = true, value_name = "NAMES")]
    only_package: Vec<String>,
    /// --without for the package stage when it runs nested.
    #[arg(long, global = true, value_name = "NAMES")]
    without_package: Vec<String>,
    /// --only for the release stage when it runs nested.
    #[arg(long, global = true, value_name = "NAMES")]
    only_release: Vec<String>,
    /// --without for the release stage when it runs nested.
    #[arg(long, global = true, value_name = "NAMES")]
    without_release: Vec<String>,
    /// --only for the snapshot stage when it runs nested.
    #[arg(long, global = true, value_name = "NAMES")]
    only_snapshot: Vec<String>,
    /// --without for the snapshot stage when it runs nested.
    #[arg(long, global = true, value_name = "NAMES")]
    without_snapshot: Vec<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Compile stylesheets and TypeScript, copy static files.
    Compile,
    /// Compile, fill placeholders, test, and document.
    Build,
    /// Check formatting and run unit tests.
    Test,
    /// Generate API documentation.
    Document,
    /// Build and assemble the release archive.
    Package,
    /// Package, commit, tag, and publish a release.
    Release,
    /// Copy the sources into a timestamped snapshot.
    Snapshot,
    /// Print the resolved configuration and parameters.
    Debug,
}

impl Commands {
    fn stage(self) -> Option<StageName> {
        match self {
            Commands::Compile => Some(StageName::Compile),
            Commands::Build => Some(StageName::Build),
            Commands::Test => Some(StageName::Test),
            Commands::Document => Some(StageName::Document),
            Commands::Package => Some(StageName::Package),
            Commands::Release => Some(StageName::Release),
            Commands::Snapshot => Some(StageName::Snapshot),
            Commands::Debug => None,
        }
    }

    fn target(self) -> &'static str {
        self.stage().map_or(DEBUG_TARGET, |stage| stage.as_str())
    }
}

impl Cli {
    fn stage_filters(&self) -> [(StageName, &[String], &[String]); 7] {
        [
            (
                StageName::Compile,
                self.only_compile.as_slice(),
                self.without_compile.as_slice(),
            ),
            (
                StageName::Build,
                self.only_build.as_slice(),
                self.without_build.as_slice(),
            ),
            (
                StageName::Test,
                self.only_test.as_slice(),
                self.without_test.as_slice(),
            ),
            (
                StageName::Document,
                self.only_document.as_slice(),
                self.without_document.as_slice(),
            ),
            (
                StageName::Package,
                self.only_package.as_slice(),
                self.without_package.as_slice(),
            ),
            (
                StageName::Release,
                self.only_release.as_slice(),
                self.without_release.as_slice(),
            ),
            (
                StageName::Snapshot,
                self.only_snapshot.as_slice(),
                self.without_snapshot.as_slice(),
            ),
        ]
    }

    fn params(&self) -> Params {
        let mut stage_only = BTreeMap::new();
        let mut stage_without = BTreeMap::new();
        for (stage, only, without) in self.stage_filters() {
            if !only.is_empty() {
                stage_only.insert(stage, Filter::parse(only));
            }
            if !without.is_empty() {
                stage_without.insert(stage, Filter::parse(without));
            }
        }

        let params = Params {
            debug: self.debug,
            verbose: self.verbose,
            notice: !self.no_notice,
            progress: self.progress,
            dryrun: self.dryrun,
            building: self.building,
            packaging: self.packaging,
            releasing: self.releasing,
            starting: false,
            log_base_level: self.log_base_level,
            only: Filter::parse(&self.only),
            without: Filter::parse(&self.without),
            stage_only,
            stage_without,
        };

        match self.cmd.stage() {
            Some(stage) => params.with_command(stage),
            None => params.cascade(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let params = cli.params();
    let logger = ConsoleLogger::new(&params);

    match run(&cli, params, logger) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            logger.report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, params: Params, logger: ConsoleLogger) -> Result<()> {
    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("project root not found: {}", cli.root.display()))?;

    let project = Project::load(root, cli.config.as_deref(), params, StageCatalog::builtin())?
        .with_logger(logger);
    project.run(cli.cmd.target())
}
