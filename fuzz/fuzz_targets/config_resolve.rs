#![no_main]

use libfuzzer_sys::fuzz_target;
use stagecraft::StageCatalog;
use stagecraft_config::{DefaultConfig, PackageMeta, UserConfig, resolve};
use stagecraft_types::StageName;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let parsed = toml::from_str::<UserConfig>(text)
        .ok()
        .or_else(|| serde_json::from_str::<UserConfig>(text).ok());
    let Some(user) = parsed else {
        return;
    };

    let package = PackageMeta {
        name: "fuzz".to_string(),
        version: "0.0.0".to_string(),
        ..PackageMeta::default()
    };
    let catalog = StageCatalog::builtin();
    if let Ok(config) = resolve(&user, &DefaultConfig::from_package(package), &catalog) {
        assert!(!config.title.trim().is_empty());
        assert_eq!(config.stages.len(), StageName::ALL.len());
    }
});
