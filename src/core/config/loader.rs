#![allow(clippy::result_large_err)]

use super::DocsConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use std::env;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "apidocs.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from workspace root (workspace/apidocs.toml)
    /// Environment variables override config file values
    /// A missing file falls back to defaults + env vars
    pub fn load_from_workspace(workspace_path: &Path) -> Result<DocsConfig, AppError> {
        Self::load(workspace_path, None)
    }

    /// Load config from an explicit file when given, otherwise from the workspace.
    /// An explicit file that does not exist is an error.
    pub fn load(workspace_path: &Path, explicit: Option<&Path>) -> Result<DocsConfig, AppError> {
        let config_file = match explicit {
            Some(path) => {
                let path = resolve_path(workspace_path, path);
                Some(Self::load_from_file(&path)?.ok_or_else(|| {
                    AppError::new(
                        ErrorCategory::ConfigError,
                        format!("Config file {} does not exist", path.display()),
                    )
                    .with_code("CFG-002")
                })?)
            }
            None => Self::load_from_file(&workspace_path.join(CONFIG_FILE_NAME))?,
        };

        let mut config = config_file.unwrap_or_default();
        Self::apply_env_overrides(&mut config);

        Ok(config)
    }

    /// Load config from specific file path
    /// Returns Ok(None) if file doesn't exist
    pub fn load_from_file(path: &Path) -> Result<Option<DocsConfig>, AppError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to read config file {}: {}", path.display(), e),
            )
            .with_code("CFG-001")
        })?;

        let config: DocsConfig = toml::from_str(&content).map_err(|e| {
            AppError::new(
                ErrorCategory::ConfigError,
                format!("Failed to parse config file {}: {}", path.display(), e),
            )
            .with_code("CFG-001")
        })?;

        Ok(Some(config))
    }

    /// Environment variables take precedence over config file values
    fn apply_env_overrides(config: &mut DocsConfig) {
        if let Ok(collection) = env::var("APIDOCS_COLLECTION") {
            config.paths.collection = PathBuf::from(collection);
        }

        if let Ok(output) = env::var("APIDOCS_OUTPUT") {
            config.paths.output = PathBuf::from(output);
        }

        if let Ok(default_tag) = env::var("APIDOCS_DEFAULT_TAG") {
            config.conversion.default_tag = default_tag;
        }

        if let Ok(enabled_str) = env::var("APIDOCS_FALLBACK_ENABLED") {
            if let Ok(enabled) = enabled_str.parse::<bool>() {
                config.fallback.enabled = enabled;
            }
        }

        if let Ok(command) = env::var("APIDOCS_FALLBACK_COMMAND") {
            config.fallback.command = command;
        }

        if let Ok(timeout) = env::var("APIDOCS_FALLBACK_TIMEOUT") {
            config.fallback.timeout = timeout;
        }

        if let Ok(bind) = env::var("APIDOCS_SERVER_BIND") {
            config.server.bind = bind;
        }

        if let Ok(route) = env::var("APIDOCS_DOCS_ROUTE") {
            config.server.docs_route = route;
        }
    }

    /// Get documentation for supported environment variables
    pub fn env_var_documentation() -> &'static [&'static str] {
        &[
            "APIDOCS_COLLECTION - Override collection path (default: collection.json)",
            "APIDOCS_OUTPUT - Override output document path (default: openapi.yml)",
            "APIDOCS_DEFAULT_TAG - Override tag for requests outside folders (default: General)",
            "APIDOCS_FALLBACK_ENABLED - Enable or disable the CLI fallback (true/false)",
            "APIDOCS_FALLBACK_COMMAND - Override fallback command (default: p2o)",
            "APIDOCS_FALLBACK_TIMEOUT - Override fallback timeout (default: 2m, 0 disables)",
            "APIDOCS_SERVER_BIND - Override docs server bind address (default: 127.0.0.1:3000)",
            "APIDOCS_DOCS_ROUTE - Override docs route (default: /api-docs)",
        ]
    }
}

/// Resolve `path` against `workspace` unless it is already absolute.
pub fn resolve_path(workspace: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}
