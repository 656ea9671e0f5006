//! Tests for configuration loading and validation

use beaver_domain::error::Error;
use beaver_infrastructure::config::{AppConfig, ConfigLoader, StorageBackend};
use beaver_infrastructure::config::loader::validate_app_config;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// Loader reading `file` with an env prefix no other test uses
fn isolated_loader(file: PathBuf, prefix: &str) -> ConfigLoader {
    ConfigLoader::new()
        .with_config_path(file)
        .with_env_prefix(prefix)
}

fn set_env(key: &str, value: &str) {
    // SAFETY: every test owns a distinct variable prefix
    unsafe {
        env::set_var(key, value);
    }
}

fn remove_env(key: &str) {
    // SAFETY: every test owns a distinct variable prefix
    unsafe {
        env::remove_var(key);
    }
}

#[test]
fn test_defaults_when_file_is_missing() {
    let dir = TempDir::new().unwrap();
    let loader = isolated_loader(dir.path().join("missing.toml"), "BEAVER_TEST_DEFAULTS");

    let config = loader.load().unwrap();

    assert_eq!(config, AppConfig::default());
    assert_eq!(config.api.endpoint, "http://localhost:8978/api/gql");
    assert_eq!(config.api.timeout(), Duration::from_secs(30));
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.storage.backend, StorageBackend::Memory);
}

#[test]
fn test_toml_file_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("beaver.toml");
    std::fs::write(
        &path,
        r#"
[api]
endpoint = "https://db.example.com/api/gql"
timeout = 5

[logging]
level = "debug"
json = true

[storage]
backend = "file"
path = "/var/lib/beaver"
"#,
    )
    .unwrap();

    let config = isolated_loader(path, "BEAVER_TEST_TOML").load().unwrap();

    assert_eq!(config.api.endpoint, "https://db.example.com/api/gql");
    assert_eq!(config.api.timeout_secs, 5);
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json_format);
    assert_eq!(config.storage.backend, StorageBackend::File);
    assert_eq!(
        config.storage.resolved_path(),
        Some(PathBuf::from("/var/lib/beaver"))
    );
}

#[test]
fn test_environment_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("beaver.toml");
    std::fs::write(&path, "[api]\ntimeout = 5\n").unwrap();

    set_env("BEAVERENVTEST_API_TIMEOUT", "12");
    set_env("BEAVERENVTEST_LOGGING_LEVEL", "warn");
    let loaded = isolated_loader(path, "BEAVERENVTEST").load();
    remove_env("BEAVERENVTEST_API_TIMEOUT");
    remove_env("BEAVERENVTEST_LOGGING_LEVEL");

    let config = loaded.unwrap();
    assert_eq!(config.api.timeout_secs, 12);
    assert_eq!(config.logging.level, "warn");
}

#[test]
fn test_malformed_file_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("beaver.toml");
    std::fs::write(&path, "[api]\ntimeout = \"soon\"\n").unwrap();

    let err = isolated_loader(path, "BEAVER_TEST_MALFORMED")
        .load()
        .unwrap_err();

    assert!(matches!(err, Error::Configuration { .. }));
}

#[test]
fn test_validation_rejects_bad_values() {
    let mut config = AppConfig::default();
    config.api.endpoint = "ftp://example.com".to_string();
    assert!(validate_app_config(&config).is_err());

    let mut config = AppConfig::default();
    config.api.timeout_secs = 0;
    assert!(validate_app_config(&config).is_err());

    let mut config = AppConfig::default();
    config.logging.level = "loud".to_string();
    assert!(validate_app_config(&config).is_err());

    assert!(validate_app_config(&AppConfig::default()).is_ok());
}

#[test]
fn test_saved_config_loads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("saved.toml");
    let mut config = AppConfig::default();
    config.api.endpoint = "https://saved.example.com/api/gql".to_string();
    config.storage.backend = StorageBackend::File;
    config.storage.path = Some(dir.path().join("state"));

    let loader = isolated_loader(path.clone(), "BEAVER_TEST_SAVED");
    loader.save_to_file(&config, &path).unwrap();

    assert_eq!(loader.config_path(), Some(path.as_path()));
    assert_eq!(loader.load().unwrap(), config);
}
