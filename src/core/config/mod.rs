use crate::core::converter::{ConversionOptions, ServerEntry};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration loaded from apidocs.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DocsConfig {
    /// Input and output locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Options handed to the in-process converter
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// External CLI used when in-process conversion yields nothing
    #[serde(default)]
    pub fallback: FallbackConfig,

    /// Docs server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Paths configuration, relative paths resolve against the workspace root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Exported collection to convert
    #[serde(default = "default_collection_path")]
    pub collection: PathBuf,

    /// Destination OpenAPI document
    #[serde(default = "default_output_path")]
    pub output: PathBuf,
}

/// Conversion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Tag applied to requests that are not inside a folder
    #[serde(default = "default_tag")]
    pub default_tag: String,

    /// Server base URLs written into the document
    #[serde(default = "default_servers")]
    pub servers: Vec<ServerEntry>,
}

/// Subprocess fallback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    #[serde(default = "default_fallback_enabled")]
    pub enabled: bool,

    /// Command resolved by the shell, invoked as `<command> <source> -f <destination>`
    #[serde(default = "default_fallback_command")]
    pub command: String,

    /// Humantime duration ("90s", "2m"); "0" or "off" waits forever
    #[serde(default = "default_fallback_timeout")]
    pub timeout: String,
}

/// Docs server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_docs_route")]
    pub docs_route: String,
}

// Default functions
fn default_collection_path() -> PathBuf {
    PathBuf::from("collection.json")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("openapi.yml")
}

fn default_tag() -> String {
    "General".to_string()
}

fn default_servers() -> Vec<ServerEntry> {
    vec![ServerEntry {
        url: "http://localhost:8000".to_string(),
        description: Some("Local development server".to_string()),
    }]
}

fn default_fallback_enabled() -> bool {
    true
}

fn default_fallback_command() -> String {
    "p2o".to_string()
}

fn default_fallback_timeout() -> String {
    "2m".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_docs_route() -> String {
    "/api-docs".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            collection: default_collection_path(),
            output: default_output_path(),
        }
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        ConversionConfig {
            default_tag: default_tag(),
            servers: default_servers(),
        }
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        FallbackConfig {
            enabled: default_fallback_enabled(),
            command: default_fallback_command(),
            timeout: default_fallback_timeout(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: default_bind(),
            docs_route: default_docs_route(),
        }
    }
}

impl ConversionConfig {
    pub fn to_options(&self) -> ConversionOptions {
        ConversionOptions {
            default_tag: self.default_tag.clone(),
            servers: self.servers.clone(),
        }
    }
}

impl FallbackConfig {
    /// Parsed timeout. `Ok(None)` means no bound.
    pub fn timeout(&self) -> Result<Option<Duration>, humantime::DurationError> {
        parse_timeout(&self.timeout)
    }
}

pub(crate) fn parse_timeout(raw: &str) -> Result<Option<Duration>, humantime::DurationError> {
    let trimmed = raw.trim();
    if matches!(trimmed, "0" | "off" | "none") {
        return Ok(None);
    }
    let duration = humantime::parse_duration(trimmed)?;
    Ok(if duration.is_zero() {
        None
    } else {
        Some(duration)
    })
}


pub mod loader;
pub mod validation;

pub use loader::ConfigLoader;
pub use validation::ConfigValidator;
