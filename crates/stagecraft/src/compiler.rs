//! Compiler contract used by the `compile` stage.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use stagecraft_process::{display_command, run_command_in_dir};
use stagecraft_types::{Args, ArgsExt};

/// Stylesheet compilation options, read from `compiler.sass`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleOptions {
    pub style: String,
    pub source_map: bool,
    pub load_paths: Vec<String>,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            style: "expanded".to_string(),
            source_map: true,
            load_paths: Vec::new(),
        }
    }
}

impl StyleOptions {
    pub fn from_args(args: &Args) -> Self {
        let defaults = Self::default();
        Self {
            style: args.str_arg("style").map(str::to_string).unwrap_or(defaults.style),
            source_map: args.bool_arg("source_map").unwrap_or(defaults.source_map),
            load_paths: args.strings_arg("load_paths").unwrap_or_default(),
        }
    }
}

pub trait Compiler {
    /// Compile one stylesheet to one destination file.
    fn compile_stylesheet(&self, src: &Path, dest: &Path, options: &StyleOptions) -> Result<()>;

    /// Compile a TypeScript project description into `out_dir`.
    fn compile_project(&self, project_file: &Path, out_dir: &Path, options: &Args) -> Result<()>;
}

/// Shells out to `sass` and `tsc`.
#[derive(Debug, Clone, Default)]
pub struct ToolCompiler {
    sass: Option<String>,
    tsc: Option<String>,
}

impl ToolCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different `sass` executable.
    pub fn with_sass(mut self, program: impl Into<String>) -> Self {
        self.sass = Some(program.into());
        self
    }

    /// Use a different `tsc` executable.
    pub fn with_tsc(mut self, program: impl Into<String>) -> Self {
        self.tsc = Some(program.into());
        self
    }

    fn sass(&self) -> &str {
        self.sass.as_deref().unwrap_or("sass")
    }

    fn tsc(&self) -> &str {
        self.tsc.as_deref().unwrap_or("tsc")
    }
}

impl Compiler for ToolCompiler {
    fn compile_stylesheet(&self, src: &Path, dest: &Path, options: &StyleOptions) -> Result<()> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let args = sass_args(src, dest, options);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let dir = src.parent().unwrap_or_else(|| Path::new("."));
        run_command_in_dir(self.sass(), &args, dir)?
            .ok()
            .with_context(|| display_command(self.sass(), &args))?;
        Ok(())
    }

    fn compile_project(&self, project_file: &Path, out_dir: &Path, options: &Args) -> Result<()> {
        let args = tsc_args(project_file, out_dir, options);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let dir = project_file.parent().unwrap_or_else(|| Path::new("."));
        run_command_in_dir(self.tsc(), &args, dir)?
            .ok()
            .with_context(|| display_command(self.tsc(), &args))?;
        Ok(())
    }
}

fn sass_args(src: &Path, dest: &Path, options: &StyleOptions) -> Vec<String> {
    let mut args = vec![format!("--style={}", options.style)];
    args.push(if options.source_map {
        "--source-map".to_string()
    } else {
        "--no-source-map".to_string()
    });
    args.extend(options.load_paths.iter().map(|p| format!("--load-path={p}")));
    args.push(src.display().to_string());
    args.push(dest.display().to_string());
    args
}

/// `compiler.ts` keys become `--key value` flags; `true` is a bare flag and
/// `false`/`null` are dropped.
fn tsc_args(project_file: &Path, out_dir: &Path, options: &Args) -> Vec<String> {
    let mut args = vec![
        "--project".to_string(),
        project_file.display().to_string(),
        "--outDir".to_string(),
        out_dir.display().to_string(),
    ];
    for (key, value) in options {
        match value {
            Value::Bool(true) => args.push(format!("--{key}")),
            Value::Bool(false) | Value::Null => {}
            Value::String(s) => args.extend([format!("--{key}"), s.clone()]),
            Value::Array(items) => {
                let joined = items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                    .collect::<Vec<_>>()
                    .join(",");
                args.extend([format!("--{key}"), joined]);
            }
            other => args.extend([format!("--{key}"), other.to_string()]),
        }
    }
    args
}
