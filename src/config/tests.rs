//! Unit tests for configuration module
//!
//! Tests configuration parsing, validation, serialization/deserialization,
//! and edge cases in configuration handling.

use super::*;
use anyhow::Result;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_default_configuration_is_valid() {
    let config = BackendConfig::default();

    assert!(config.validate().is_ok());
    assert!(!config.glx.no_stencil);
    assert_eq!(config.glx.swap_method, SwapMethod::Undefined);
    assert_eq!(config.glx.max_buffer_age, 5);
    assert!(!config.glx.debug_context);
    assert!(config.general.use_overlay);
}

#[test]
fn test_configuration_serialization_roundtrip() -> Result<()> {
    let mut original_config = BackendConfig::default();
    original_config.glx.swap_method = SwapMethod::BufferAge;
    original_config.glx.no_stencil = true;

    let toml_string = toml::to_string(&original_config)?;
    assert!(toml_string.contains("swap_method = \"buffer-age\""));

    let deserialized_config: BackendConfig = toml::from_str(&toml_string)?;
    assert_eq!(original_config, deserialized_config);

    Ok(())
}

#[test]
fn test_configuration_from_file() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("test_config.toml");

    let test_config = r#"
[glx]
no_stencil = true
swap_method = "buffer-age"
max_buffer_age = 3
debug_context = true

[general]
debug = true
use_overlay = false
"#;

    fs::write(&file_path, test_config)?;

    let config = BackendConfig::load(&file_path)?;

    assert!(config.glx.no_stencil);
    assert_eq!(config.glx.swap_method, SwapMethod::BufferAge);
    assert_eq!(config.glx.max_buffer_age, 3);
    assert!(config.glx.debug_context);
    assert!(config.general.debug);
    assert!(!config.general.use_overlay);

    Ok(())
}

#[test]
fn test_partial_configuration_uses_defaults() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("partial_config.toml");

    fs::write(&file_path, "[glx]\nswap_method = \"exchange\"\n")?;

    let config = BackendConfig::load(&file_path)?;

    assert_eq!(config.glx.swap_method, SwapMethod::Exchange);
    assert_eq!(config.glx.max_buffer_age, GlxConfig::default().max_buffer_age);
    assert!(!config.glx.no_stencil);
    assert_eq!(config.general, GeneralConfig::default());

    Ok(())
}

#[test]
fn test_empty_file_is_default() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("empty.toml");
    fs::write(&file_path, "")?;

    assert_eq!(BackendConfig::load(&file_path)?, BackendConfig::default());
    Ok(())
}

#[test]
fn test_unknown_swap_method_rejected() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("bad_swap.toml");
    fs::write(&file_path, "[glx]\nswap_method = \"triple\"\n")?;

    assert!(BackendConfig::load(&file_path).is_err());
    Ok(())
}

#[test]
fn test_invalid_max_buffer_age() {
    let mut config = BackendConfig::default();

    config.glx.max_buffer_age = 0;
    assert!(config.validate().is_err());

    config.glx.max_buffer_age = MAX_BUFFER_AGE_LIMIT + 1;
    assert!(config.validate().is_err());

    config.glx.max_buffer_age = MAX_BUFFER_AGE_LIMIT;
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_file_is_reported() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("invalid.toml");
    fs::write(&file_path, "[glx\nno_stencil = ")?;

    let err = BackendConfig::load(&file_path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
    Ok(())
}

#[test]
fn test_missing_file_is_reported() {
    let err = BackendConfig::load("/nonexistent/axiom-glx.toml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_save_and_reload() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("saved.toml");

    let mut config = BackendConfig::default();
    config.glx.swap_method = SwapMethod::Copy;
    config.glx.max_buffer_age = 2;
    config.save(&file_path)?;

    assert_eq!(BackendConfig::load(&file_path)?, config);
    Ok(())
}

#[test]
fn test_debug_flag_sets_log_filter() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("glx.toml");
    fs::write(&path, "[general]\ndebug = true\n")?;

    let config = BackendConfig::load(&path)?;
    assert_eq!(config.general.log_filter(), "debug");
    assert_eq!(BackendConfig::default().general.log_filter(), "info");

    Ok(())
}
