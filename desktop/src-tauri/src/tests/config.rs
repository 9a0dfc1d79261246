//! Startup configuration fallback.
//!
//! Assumes no `MD_*` overrides are set in the test environment.

use crate::load_config;

use std::fs;

#[test]
fn given_empty_dir_when_load_config_then_defaults_without_error() {
    // Given
    let temp = tempfile::tempdir().unwrap();

    // When
    let (config, error) = load_config(temp.path());

    // Then
    assert!(error.is_none());
    assert_eq!(config.backend.port, 5000);
    assert_eq!(config.logging.directory, "logs");
}

#[test]
fn given_malformed_toml_when_load_config_then_defaults_with_error() {
    // Given
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("config.toml"), "[backend\nport = ").unwrap();

    // When
    let (config, error) = load_config(temp.path());

    // Then
    let error = error.expect("malformed file should be reported");
    assert!(error.to_string().contains("config.toml"));
    assert_eq!(config.backend.port, 5000);
}

#[test]
fn given_privileged_port_when_load_config_then_validation_error_and_defaults() {
    // Given
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("config.toml"), "[backend]\nport = 80\n").unwrap();

    // When
    let (config, error) = load_config(temp.path());

    // Then
    assert!(error.is_some());
    assert_eq!(config.backend.port, 5000);
}

#[test]
fn given_valid_overrides_when_load_config_then_values_kept() {
    // Given
    let temp = tempfile::tempdir().unwrap();
    fs::write(
        temp.path().join("config.toml"),
        "[backend]\nport = 5050\n\n[logging]\ndirectory = \"diagnostics\"\n",
    )
    .unwrap();

    // When
    let (config, error) = load_config(temp.path());

    // Then
    assert!(error.is_none());
    assert_eq!(config.backend.port, 5050);
    assert_eq!(config.logging.directory, "diagnostics");
}
