//! Integration tests for config file resolution and graceful degradation
//!
//! Covers:
//! - Missing TOML files do not prevent startup (defaults + warning)
//! - Malformed TOML files are reported as configuration errors
//! - Config path priority: explicit argument → VOXIFY_CONFIG → platform dir
//!
//! Note: Uses serial_test to prevent ENV variable race conditions.
//! Tests that manipulate VOXIFY_CONFIG are marked with #[serial].

use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;
use voxify_common::config::{
    load_or_default, load_toml_config, load_with_source, resolve_config_path, CONFIG_ENV_VAR,
};
use voxify_common::{ConfigSource, Error, TomlConfig};

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("does-not-exist.toml");

    let config = load_or_default(Some(&missing)).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_no_path_falls_back_to_defaults() {
    let config = load_or_default(None).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_full_file_is_loaded() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("voxify.toml");
    std::fs::write(
        &path,
        r#"
bind_address = "0.0.0.0:8080"
audio_root = "/srv/voxify/uploads"

[models]
gate = "/srv/models/gate.onnx"
fusion = "/srv/models/fusion.onnx"

[pipeline]
fusion_sample_rate = 8000
gate_sample_rate = 16000
time_frames = 1024

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config = load_or_default(Some(&path)).unwrap();
    assert_eq!(config.bind_address, "0.0.0.0:8080");
    assert_eq!(config.audio_root, Some(PathBuf::from("/srv/voxify/uploads")));
    assert_eq!(config.models.gate, PathBuf::from("/srv/models/gate.onnx"));
    assert_eq!(config.models.fusion, PathBuf::from("/srv/models/fusion.onnx"));
    assert_eq!(config.pipeline.time_frames, 1024);
    assert_eq!(config.logging.level, "debug");
    assert!(config.validate().is_ok());
}

#[test]
fn test_source_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("voxify.toml");
    std::fs::write(&path, "bind_address = \"127.0.0.1:6000\"\n").unwrap();

    let (config, source) = load_with_source(Some(&path)).unwrap();
    assert_eq!(config.bind_address, "127.0.0.1:6000");
    assert_eq!(source, ConfigSource::File(path.clone()));

    let missing = temp_dir.path().join("missing.toml");
    let (config, source) = load_with_source(Some(&missing)).unwrap();
    assert_eq!(config, TomlConfig::default());
    assert_eq!(source, ConfigSource::MissingFile(missing));

    let (_, source) = load_with_source(None).unwrap();
    assert_eq!(source, ConfigSource::Defaults);
}

#[test]
fn test_malformed_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "[pipeline\nfusion_sample_rate = ").unwrap();

    let result = load_or_default(Some(&path));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_load_toml_config_reports_missing_file() {
    let result = load_toml_config(&PathBuf::from("/nonexistent/voxify.toml"));
    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("Read TOML failed")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_env_var_names_config_file() {
    let test_path = "/tmp/voxify-test-env.toml";
    env::set_var(CONFIG_ENV_VAR, test_path);

    let resolved = resolve_config_path(None);
    assert_eq!(resolved, Some(PathBuf::from(test_path)));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_arg_beats_env_var() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/voxify-from-env.toml");

    let cli = PathBuf::from("/tmp/voxify-from-cli.toml");
    let resolved = resolve_config_path(Some(&cli));
    assert_eq!(resolved, Some(cli));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_blank_env_var_is_ignored() {
    env::set_var(CONFIG_ENV_VAR, "   ");

    let resolved = resolve_config_path(None);
    assert_ne!(resolved, Some(PathBuf::from("   ")));

    env::remove_var(CONFIG_ENV_VAR);
}
