//! Registry of stage classes by name.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use stagecraft_config::KnownClasses;

use crate::stage::StageClass;
use crate::stages::{
    BuildStage, CompileStage, DocumentStage, PackageStage, ReleaseStage, SnapshotStage, TestStage,
};

/// Stage classes that configuration entries may name.
///
/// Register custom classes before resolving the configuration; the
/// resolver only adopts class names the catalog knows.
#[derive(Clone, Default)]
pub struct StageCatalog {
    classes: BTreeMap<String, Arc<dyn StageClass>>,
}

impl StageCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The seven built-in classes, each registered under its stage name.
    pub fn builtin() -> Self {
        Self::new()
            .with(CompileStage)
            .with(BuildStage)
            .with(TestStage)
            .with(DocumentStage)
            .with(PackageStage)
            .with(ReleaseStage)
            .with(SnapshotStage)
    }

    /// Register `class`, replacing any class with the same name.
    pub fn register(&mut self, class: impl StageClass + 'static) {
        let class: Arc<dyn StageClass> = Arc::new(class);
        self.classes.insert(class.class_name().to_string(), class);
    }

    pub fn with(mut self, class: impl StageClass + 'static) -> Self {
        self.register(class);
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn StageClass> {
        self.classes.get(name).map(|class| class.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl KnownClasses for StageCatalog {
    fn knows(&self, class: &str) -> bool {
        self.contains(class)
    }
}

impl fmt::Debug for StageCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.class_names()).finish()
    }
}
