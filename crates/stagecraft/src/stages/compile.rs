use anyhow::Result;
use serde_json::json;
use stagecraft_types::{Args, ArgsExt};

use super::object;
use crate::compiler::StyleOptions;
use crate::stage::{Stage, StageClass, SubStage};

/// Compiles stylesheets and TypeScript, and copies static files, into
/// the dist directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileStage;

impl StageClass for CompileStage {
    fn class_name(&self) -> &str {
        "compile"
    }

    fn clr(&self) -> &str {
        "blue"
    }

    fn default_args(&self) -> Args {
        object(json!({ "tsconfig": "tsconfig.json" }))
    }

    fn sub_stages(&self) -> Vec<SubStage<'_>> {
        vec![
            SubStage::new("scss", scss),
            SubStage::new("ts", ts),
            SubStage::new("files", files),
        ]
    }
}

fn scss(stage: &Stage<'_>) -> Result<()> {
    let (Some(src), Some(dist)) = (stage.src_dir("scss"), stage.dist_dir("scss")) else {
        stage.verbose("no scss paths configured", 2);
        return Ok(());
    };
    if !src.is_dir() {
        stage.verbose(&format!("no stylesheets in {}", src.display()), 2);
        return Ok(());
    }

    let files = stage.files();
    let options = StyleOptions::from_args(&stage.config().compiler_options("sass"));
    let pattern = src.join("**").join("*.scss");
    for source in files.glob(&pattern.to_string_lossy())? {
        // Partials are only compiled through the files that import them.
        let partial = source
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('_'));
        if partial {
            continue;
        }
        let rel = source.strip_prefix(&src).unwrap_or(&source);
        let dest = dist.join(rel).with_extension("css");
        stage.progress(
            &format!(
                "{} -> {}",
                files.relative(&source).display(),
                files.relative(&dest).display()
            ),
            2,
        );
        if stage.is_dryrun() {
            continue;
        }
        stage.compiler().compile_stylesheet(&source, &dest, &options)?;
    }
    Ok(())
}

fn ts(stage: &Stage<'_>) -> Result<()> {
    let files = stage.files();
    let tsconfig = stage.args().str_arg("tsconfig").unwrap_or("tsconfig.json");
    let project_file = files.resolve(tsconfig);
    if !project_file.is_file() {
        stage.verbose(&format!("no {tsconfig}; skipping TypeScript"), 2);
        return Ok(());
    }
    let Some(out_dir) = stage.dist_dir("ts") else {
        stage.verbose("no ts output path configured", 2);
        return Ok(());
    };

    stage.progress(
        &format!("{tsconfig} -> {}", files.relative(&out_dir).display()),
        2,
    );
    if stage.is_dryrun() {
        return Ok(());
    }
    let options = stage.config().compiler_options("ts");
    stage.compiler().compile_project(&project_file, &out_dir, &options)
}

fn files(stage: &Stage<'_>) -> Result<()> {
    let (Some(src), Some(dist)) = (stage.src_dir("files"), stage.dist_dir("files")) else {
        stage.verbose("no files paths configured", 2);
        return Ok(());
    };
    let files = stage.files();
    let copied = files.copy_dir(&src, &dist)?;
    stage.verbose(
        &format!(
            "copied {copied} file(s) from {} to {}",
            files.relative(&src).display(),
            files.relative(&dist).display()
        ),
        2,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::console::{LogKind, MemoryLogger};
    use crate::project::Project;
    use crate::stages::testing::{FakeCompiler, resolved, write};
    use serde_json::json;
    use stagecraft_types::{Params, StageName};
    use tempfile::tempdir;

    fn params() -> Params {
        Params::for_command(StageName::Compile)
    }

    #[test]
    fn compiles_non_partial_stylesheets_preserving_layout() {
        let td = tempdir().expect("tempdir");
        write(td.path(), "src/scss/app.scss", "");
        write(td.path(), "src/scss/_vars.scss", "");
        write(td.path(), "src/scss/pages/home.scss", "");

        let compiler = FakeCompiler::default();
        let config = resolved(json!({"compiler": {"sass": {"style": "compressed"}}}), "1.0.0");
        let project = Project::new(td.path(), config, params()).with_compiler(compiler.clone());
        project.run("compile").expect("compile");

        assert!(td.path().join("dist/css/app.css").exists());
        assert!(td.path().join("dist/css/pages/home.css").exists());
        assert!(!td.path().join("dist/css/_vars.css").exists());
        let calls = compiler.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.ends_with(" compressed")));
    }

    #[test]
    fn custom_tsconfig_from_stage_args() {
        let td = tempdir().expect("tempdir");
        write(td.path(), "tsconfig.lib.json", "{}");

        let compiler = FakeCompiler::default();
        let config = resolved(json!({"stages": {"compile": {"tsconfig": "tsconfig.lib.json"}}}), "1.0.0");
        let project = Project::new(td.path(), config, params()).with_compiler(compiler.clone());
        project.run("compile").expect("compile");

        let calls = compiler.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].ends_with("tsconfig.lib.json"));
        assert!(td.path().join("dist/js/index.js").exists());
    }

    #[test]
    fn missing_inputs_are_skipped() {
        let td = tempdir().expect("tempdir");
        let logger = MemoryLogger::new();
        let compiler = FakeCompiler::default();
        let project = Project::new(td.path(), resolved(json!({}), "1.0.0"), params())
            .with_compiler(compiler.clone())
            .with_logger(logger.clone());

        project.run("compile").expect("compile");
        assert!(compiler.calls.borrow().is_empty());
        assert!(logger.contains(LogKind::Verbose, "no stylesheets"));
        assert!(logger.contains(LogKind::Verbose, "skipping TypeScript"));
    }

    #[test]
    fn dryrun_skips_compilers_and_copies() {
        let td = tempdir().expect("tempdir");
        write(td.path(), "src/scss/app.scss", "");
        write(td.path(), "tsconfig.json", "{}");
        write(td.path(), "src/files/a.txt", "a");

        let logger = MemoryLogger::new();
        let compiler = FakeCompiler::default();
        let params = Params {
            dryrun: true,
            ..params()
        };
        let project = Project::new(td.path(), resolved(json!({}), "1.0.0"), params)
            .with_compiler(compiler.clone())
            .with_logger(logger.clone());

        project.run("compile").expect("compile");
        assert!(compiler.calls.borrow().is_empty());
        assert!(!td.path().join("dist").exists());
        assert!(logger.contains(LogKind::Progress, "src/scss/app.scss -> dist/css/app.css"));
    }

    #[test]
    fn custom_dist_layout_is_honoured() {
        let td = tempdir().expect("tempdir");
        write(td.path(), "src/files/a.txt", "a");

        let config = resolved(json!({"paths": {"dist": "public/{name}"}}), "1.0.0");
        let project = Project::new(td.path(), config, params()).with_compiler(FakeCompiler::default());
        project.run("compile").expect("compile");

        assert!(td.path().join("public/files/a.txt").exists());
    }
}
