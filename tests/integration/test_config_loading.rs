use apidocs::core::config::{ConfigLoader, ConfigValidator};
use apidocs::core::ErrorCategory;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn clear_apidocs_env() {
    for v in &[
        "APIDOCS_COLLECTION",
        "APIDOCS_OUTPUT",
        "APIDOCS_DEFAULT_TAG",
        "APIDOCS_FALLBACK_ENABLED",
        "APIDOCS_FALLBACK_COMMAND",
        "APIDOCS_FALLBACK_TIMEOUT",
        "APIDOCS_SERVER_BIND",
        "APIDOCS_DOCS_ROUTE",
    ] {
        env::remove_var(v);
    }
}

#[test]
#[serial]
fn test_defaults_without_config_file() {
    clear_apidocs_env();
    let temp_dir = TempDir::new().unwrap();

    let config = ConfigLoader::load_from_workspace(temp_dir.path()).unwrap();

    assert_eq!(config.paths.collection, PathBuf::from("collection.json"));
    assert_eq!(config.paths.output, PathBuf::from("openapi.yml"));
    assert_eq!(config.conversion.default_tag, "General");
    assert_eq!(config.conversion.servers.len(), 1);
    assert_eq!(config.conversion.servers[0].url, "http://localhost:8000");
    assert!(config.fallback.enabled);
    assert_eq!(config.fallback.command, "p2o");
    assert_eq!(
        config.fallback.timeout().unwrap(),
        Some(Duration::from_secs(120))
    );
    assert_eq!(config.server.bind, "127.0.0.1:3000");
    assert_eq!(config.server.docs_route, "/api-docs");
    assert!(ConfigValidator::validate(&config).is_ok());
}

/// Test integration of config loading with environment variables
#[test]
#[serial]
fn test_config_file_then_env_precedence() {
    clear_apidocs_env();
    let temp_dir = TempDir::new().unwrap();
    let workspace_path = temp_dir.path();

    let config_content = r#"
[paths]
collection = "exports/shop.postman_collection.json"
output = "public/openapi.yml"

[conversion]
default_tag = "Misc"
servers = [
  { url = "https://api.example.com", description = "Production" },
  { url = "/" },
]

[fallback]
command = "npx postman-to-openapi"
timeout = "45s"

[server]
bind = "0.0.0.0:8080"
docs_route = "/docs"
"#;
    fs::write(workspace_path.join("apidocs.toml"), config_content).unwrap();

    let config = ConfigLoader::load_from_workspace(workspace_path).unwrap();
    assert_eq!(
        config.paths.collection,
        PathBuf::from("exports/shop.postman_collection.json")
    );
    assert_eq!(config.conversion.default_tag, "Misc");
    assert_eq!(config.conversion.servers.len(), 2);
    assert_eq!(
        config.conversion.servers[0].description.as_deref(),
        Some("Production")
    );
    assert_eq!(config.conversion.servers[1].description, None);
    assert_eq!(config.fallback.command, "npx postman-to-openapi");
    assert_eq!(
        config.fallback.timeout().unwrap(),
        Some(Duration::from_secs(45))
    );
    assert_eq!(config.server.docs_route, "/docs");
    assert!(ConfigValidator::validate(&config).is_ok());

    env::set_var("APIDOCS_OUTPUT", "build/openapi.yml");
    env::set_var("APIDOCS_FALLBACK_ENABLED", "false");
    env::set_var("APIDOCS_FALLBACK_TIMEOUT", "off");

    let config = ConfigLoader::load_from_workspace(workspace_path).unwrap();
    assert_eq!(config.paths.output, PathBuf::from("build/openapi.yml"));
    assert!(!config.fallback.enabled);
    assert_eq!(config.fallback.timeout().unwrap(), None);
    // untouched by env
    assert_eq!(config.server.bind, "0.0.0.0:8080");

    clear_apidocs_env();
}

#[test]
#[serial]
fn test_explicit_config_file() {
    clear_apidocs_env();
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("conf")).unwrap();
    fs::write(
        temp_dir.path().join("conf/docs.toml"),
        "[conversion]\ndefault_tag = \"Other\"\n",
    )
    .unwrap();

    let config =
        ConfigLoader::load(temp_dir.path(), Some(Path::new("conf/docs.toml"))).unwrap();
    assert_eq!(config.conversion.default_tag, "Other");
    assert_eq!(config.paths.output, PathBuf::from("openapi.yml"));
}

#[test]
#[serial]
fn test_missing_explicit_config_file_is_error() {
    clear_apidocs_env();
    let temp_dir = TempDir::new().unwrap();
    let err = ConfigLoader::load(temp_dir.path(), Some(Path::new("missing.toml"))).unwrap_err();
    assert_eq!(err.category, ErrorCategory::ConfigError);
    assert_eq!(err.code, "CFG-002");
}

#[test]
#[serial]
fn test_malformed_config_file_is_error() {
    clear_apidocs_env();
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("apidocs.toml"), "[paths\ncollection = ").unwrap();
    let err = ConfigLoader::load_from_workspace(temp_dir.path()).unwrap_err();
    assert_eq!(err.code, "CFG-001");
}

#[test]
#[serial]
fn test_validation_rejects_bad_values() {
    clear_apidocs_env();
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("apidocs.toml"),
        "[server]\nbind = \"localhost\"\ndocs_route = \"api-docs\"\n",
    )
    .unwrap();

    let config = ConfigLoader::load_from_workspace(temp_dir.path()).unwrap();
    let err = ConfigValidator::validate(&config).unwrap_err();
    assert_eq!(err.category, ErrorCategory::ConfigError);
    assert_eq!(err.code, "CFG-003");
}
