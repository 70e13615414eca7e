use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use serde_json::{Value, json};
use stagecraft_types::{Args, ArgsExt, StageName};

use super::object;
use crate::fs::WritePolicy;
use crate::stage::{Stage, StageClass, SubStage};

/// Compiles, fills in placeholders, tests, and documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildStage;

impl StageClass for BuildStage {
    fn class_name(&self) -> &str {
        "build"
    }

    fn clr(&self) -> &str {
        "green"
    }

    fn default_args(&self) -> Args {
        object(json!({
            "replace": {},
            "extensions": ["js", "css", "html", "json", "md", "txt", "svg"],
        }))
    }

    fn sub_stages(&self) -> Vec<SubStage<'_>> {
        vec![
            SubStage::new("compile", |stage: &Stage<'_>| stage.run_stage(StageName::Compile, 1)),
            SubStage::new("replace", replace),
            SubStage::new("test", |stage: &Stage<'_>| stage.run_stage(StageName::Test, 1)),
            SubStage::new("document", |stage: &Stage<'_>| {
                stage.run_stage(StageName::Document, 1)
            }),
        ]
    }
}

/// `{{key}}` placeholders and their values.
fn placeholders(stage: &Stage<'_>) -> BTreeMap<String, String> {
    let config = stage.config();
    let mut values = BTreeMap::from([
        ("title".to_string(), config.title.clone()),
        ("name".to_string(), config.package.name.clone()),
        ("version".to_string(), config.package.version.clone()),
        (
            "description".to_string(),
            config.package.description.clone().unwrap_or_default(),
        ),
    ]);
    if let Some(extra) = stage.args().object_arg("replace") {
        for (key, value) in extra {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            values.insert(key.clone(), value);
        }
    }
    values
}

fn fill(text: &str, values: &BTreeMap<String, String>) -> String {
    values.iter().fold(text.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{{{key}}}}}"), value)
    })
}

fn replace(stage: &Stage<'_>) -> Result<()> {
    let files = stage.files();
    let values = placeholders(stage);
    let extensions: BTreeSet<String> = stage
        .args()
        .strings_arg("extensions")
        .unwrap_or_default()
        .into_iter()
        .collect();

    let dirs: BTreeSet<PathBuf> = stage
        .config()
        .paths
        .dist
        .values()
        .map(|dir| files.resolve(dir))
        .collect();

    let mut changed = 0usize;
    for dir in dirs {
        for file in files.files_under(&dir)? {
            let matches_ext = file
                .extension()
                .is_some_and(|ext| extensions.contains(ext.to_string_lossy().as_ref()));
            if !matches_ext {
                continue;
            }
            let text = files.read(&file)?;
            let filled = fill(&text, &values);
            if filled == text {
                continue;
            }
            stage.verbose(&format!("replacing in {}", files.relative(&file).display()), 2);
            files.write(&file, &filled, WritePolicy::Force)?;
            changed += 1;
        }
    }
    stage.verbose(&format!("placeholders replaced in {changed} file(s)"), 2);
    Ok(())
}
