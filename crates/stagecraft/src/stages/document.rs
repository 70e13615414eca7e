use anyhow::{Context, Result};
use serde_json::json;
use stagecraft_process::{command_exists, display_command, run_command_in_dir};
use stagecraft_types::{Args, ArgsExt};

use super::object;
use crate::stage::{Stage, StageClass, SubStage};

/// Generates API documentation with TypeDoc.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentStage;

impl StageClass for DocumentStage {
    fn class_name(&self) -> &str {
        "document"
    }

    fn clr(&self) -> &str {
        "magenta"
    }

    fn default_args(&self) -> Args {
        object(json!({ "entry": "src/ts/index.ts", "typedoc": "typedoc" }))
    }

    fn sub_stages(&self) -> Vec<SubStage<'_>> {
        vec![SubStage::new("typedoc", typedoc)]
    }
}

fn typedoc(stage: &Stage<'_>) -> Result<()> {
    let files = stage.files();
    let entry = stage.args().str_arg("entry").unwrap_or("src/ts/index.ts");
    if !files.is_file(entry) {
        stage.verbose(&format!("no {entry}; skipping documentation"), 2);
        return Ok(());
    }
    let Some(out) = stage.config().paths.dist("docs") else {
        stage.verbose("no docs output path configured", 2);
        return Ok(());
    };

    let program = stage.args().str_arg("typedoc").unwrap_or("typedoc");
    let args = ["--out", out, entry];
    let line = display_command(program, &args);
    if !command_exists(program) {
        stage.warn(&format!("{program} is not installed; skipping `{line}`"), 2);
        return Ok(());
    }
    if stage.is_dryrun() {
        stage.notice(&format!("would run `{line}`"), 2);
        return Ok(());
    }

    stage.progress(&line, 2);
    run_command_in_dir(program, &args, stage.root())?
        .ok()
        .with_context(|| format!("`{line}` failed"))?;
    Ok(())
}
