use std::fs;
use vitalis_core::config::{DispatchMode, OrchestratorConfig};
use vitalis_infrastructure::ConfigService;

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let service = ConfigService::with_path(dir.path().join("config.toml"));

    assert_eq!(service.get_config(), OrchestratorConfig::default());
}

#[test]
fn test_partial_file_merges_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "page_size = 5\ndispatch = \"remote\"\n").unwrap();

    let config = ConfigService::with_path(&path).load().unwrap();
    assert_eq!(config.page_size, 5);
    assert_eq!(config.dispatch, DispatchMode::Remote);
    assert_eq!(config.max_history, 20);
}

#[test]
fn test_invalid_toml_is_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "page_size = \"many\"").unwrap();

    let service = ConfigService::with_path(&path);
    assert!(service.load().unwrap_err().is_serialization());
    // get_config falls back instead of failing.
    assert_eq!(service.get_config(), OrchestratorConfig::default());
}

#[test]
fn test_out_of_range_value_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "retry_attempts = 0").unwrap();

    assert!(ConfigService::with_path(&path).load().is_err());
}

#[test]
fn test_cache_until_invalidated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "max_history = 7").unwrap();

    let service = ConfigService::with_path(&path);
    assert_eq!(service.get_config().max_history, 7);

    fs::write(&path, "max_history = 9").unwrap();
    assert_eq!(service.get_config().max_history, 7);

    service.invalidate_cache();
    assert_eq!(service.get_config().max_history, 9);
}

#[test]
fn test_save_round_trips_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/config.toml");
    let service = ConfigService::with_path(&path);

    let config = OrchestratorConfig {
        cache_ttl_secs: 60,
        ..Default::default()
    };
    service.save(&config).unwrap();

    let reloaded = ConfigService::with_path(&path).load().unwrap();
    assert_eq!(reloaded, config);
}
