//! In-process collection converters.
//!
//! A [`Converter`] exposes the two call shapes the conversion ladder knows
//! about. Either shape may hand back the rendered document, or return `None`
//! when the converter only wrote the destination as a side effect.

#![allow(clippy::result_large_err)]

pub mod postman;
pub mod schema;

pub use postman::{PostmanConverter, PostmanError};

use crate::core::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One entry of the OpenAPI `servers` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Fixed options handed to every conversion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Tag for requests that are not inside a folder.
    pub default_tag: String,
    pub servers: Vec<ServerEntry>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            default_tag: "General".to_string(),
            servers: Vec::new(),
        }
    }
}

#[async_trait]
pub trait Converter: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// `(input, destination, options)` call shape.
    async fn convert_to_file(
        &self,
        input: &str,
        destination: &Path,
        options: &ConversionOptions,
    ) -> Result<Option<String>, AppError>;

    /// `(input, options)` call shape.
    async fn convert(
        &self,
        input: &str,
        options: &ConversionOptions,
    ) -> Result<Option<String>, AppError>;
}
