//! Persistence and config file tests.

use std::path::PathBuf;
use tempfile::TempDir;

use crate::config::Config;
use crate::error::StoreError;
use crate::persistence::{ensure_dir, load_json, load_json_or_default, save_json};

// ============================================================================
// JSON Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_save_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let nested_path = temp_dir.path().join("deeply").join("nested").join("test.json");

    save_json(&nested_path, &serde_json::json!({"key": "value"}))
        .await
        .unwrap();
    assert!(nested_path.exists());
    assert!(!nested_path.with_extension("json.tmp").exists());
}

#[tokio::test]
async fn test_load_nonexistent_file_is_io_error() {
    let file_path = PathBuf::from("/nonexistent/path/config.json");

    let result: Result<Config, _> = load_json(&file_path).await;
    assert!(matches!(result, Err(StoreError::Io(_))));
}

#[tokio::test]
async fn test_load_or_default_on_corrupt_file() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("config.json");
    tokio::fs::write(&file_path, "{ not json").await.unwrap();

    let config: Config = load_json_or_default(&file_path).await;
    assert_eq!(config, Config::default());
}

#[tokio::test]
async fn test_ensure_dir_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let dir_path = temp_dir.path().join("test_dir");

    ensure_dir(&dir_path).await.unwrap();
    ensure_dir(&dir_path).await.unwrap();

    assert!(dir_path.is_dir());
}

// ============================================================================
// Config File Tests
// ============================================================================

#[tokio::test]
async fn test_config_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("transitsync").join("config.json");

    let mut config = Config::default();
    config.api.api_key = Some("k-123".to_string());
    config.sync.debounce_ms = 500;
    config.sync.route_cache_ttl_secs = Some(3_600);
    config.log_level = "debug".to_string();

    config.save_to(&file_path).await.unwrap();
    let loaded = Config::load_from(&file_path).await.unwrap();

    assert_eq!(loaded, config);
}

#[tokio::test]
async fn test_config_missing_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let loaded = Config::load_from(&temp_dir.path().join("absent.json"))
        .await
        .unwrap();
    assert_eq!(loaded, Config::default());
}

#[tokio::test]
async fn test_config_invalid_values_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("config.json");
    tokio::fs::write(&file_path, r#"{"api": {"base_url": "not a url"}}"#)
        .await
        .unwrap();

    let result = Config::load_from(&file_path).await;
    assert!(matches!(result, Err(StoreError::Config(_))));
}

#[tokio::test]
async fn test_config_without_key_omits_field() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("config.json");

    Config::default().save_to(&file_path).await.unwrap();
    let content = tokio::fs::read_to_string(&file_path).await.unwrap();

    assert!(!content.contains("\"api_key\""));
    assert!(content.contains("MBTA_API_KEY"));
}
