//! Layered configuration loading

use bamboo::config::sources::workspace_file::environment_name;
use bamboo::config::{BambooConfig, ConfigLoader};
use bamboo::error::ConfigError;
use bamboo::pipeline::Pipeline;
use bamboo::stage::Multiplex;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// Serializes tests that read or write `BAMBOO__*` variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn write_workspace_file(root: &Path, name: &str, contents: &str) {
    let dir = root.join("config");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn test_workspace_without_config_uses_defaults() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = TempDir::new().unwrap();
    let config = ConfigLoader::load(temp_dir.path()).unwrap();
    assert_eq!(config.cache.capacity, 128);
    assert_eq!(config.source.similarity_threshold, 0.90);
}

#[test]
fn test_environment_file_overrides_base_file() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = TempDir::new().unwrap();
    write_workspace_file(
        temp_dir.path(),
        "config.toml",
        "[cache]\ncapacity = 32\n\n[writer]\njpeg_quality = 75\n",
    );
    write_workspace_file(
        temp_dir.path(),
        &format!("{}.toml", environment_name()),
        "[cache]\ncapacity = 8\n",
    );

    let config = ConfigLoader::load(temp_dir.path()).unwrap();
    assert_eq!(config.cache.capacity, 8);
    assert_eq!(config.writer.jpeg_quality, 75);
}

#[test]
fn test_environment_variables_override_files() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = TempDir::new().unwrap();
    write_workspace_file(temp_dir.path(), "config.toml", "[source]\nlimit = 3\n");

    std::env::set_var("BAMBOO__SOURCE__LIMIT", "7");
    std::env::set_var("BAMBOO__PIPELINE__STATS_ON_STOP", "false");
    let result = ConfigLoader::load(temp_dir.path());
    std::env::remove_var("BAMBOO__SOURCE__LIMIT");
    std::env::remove_var("BAMBOO__PIPELINE__STATS_ON_STOP");

    let config = result.unwrap();
    assert_eq!(config.source.limit, Some(7));
    assert!(!config.pipeline.stats_on_stop);
}

#[test]
fn test_invalid_workspace_config_lists_all_problems() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = TempDir::new().unwrap();
    write_workspace_file(
        temp_dir.path(),
        "config.toml",
        "[cache]\ncapacity = 0\n\n[logging]\nformat = \"xml\"\n",
    );

    match ConfigLoader::load(temp_dir.path()) {
        Err(ConfigError::Invalid(problems)) => {
            assert_eq!(problems.len(), 2);
            assert!(problems[0].starts_with("cache:"));
            assert!(problems[1].starts_with("logging:"));
        }
        other => panic!("expected invalid configuration, got {:?}", other),
    }
}

#[test]
fn test_pipeline_built_from_config() {
    let mut config = BambooConfig::default();
    config.cache.capacity = 4;

    let mut pipeline = Pipeline::from_config(&config).unwrap();
    pipeline.add_linear_pipeline(vec![Box::new(Multiplex)]).unwrap();
    assert_eq!(pipeline.cache().stats().images.entries, 0);
    pipeline.run(|_| Ok(())).unwrap();
}
