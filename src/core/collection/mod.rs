//! Collection Normalizer.
//!
//! Reads an exported collection, resolves the optional `collection` envelope
//! (the shape produced by the Postman API export) and renders the text handed
//! to a [`Converter`](crate::core::converter::Converter).

#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use serde_json::Value;
use std::path::Path;

/// Top-level key whose value is the real collection.
pub const ENVELOPE_KEY: &str = "collection";

/// A parsed collection file, before or after the envelope is resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionDocument {
    /// The document is the collection itself.
    Raw(Value),
    /// The collection sits under [`ENVELOPE_KEY`]; holds the inner value.
    Enveloped(Value),
}

impl CollectionDocument {
    /// Classify a parsed value. Only the top level is inspected.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut map) if map.get(ENVELOPE_KEY).is_some_and(|v| !v.is_null()) => {
                let inner = map.remove(ENVELOPE_KEY).unwrap_or(Value::Null);
                CollectionDocument::Enveloped(inner)
            }
            other => CollectionDocument::Raw(other),
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, AppError> {
        let value: Value = serde_json::from_slice(bytes).map_err(|err| {
            AppError::new(
                ErrorCategory::ParseError,
                format!("collection is not valid JSON: {}", err),
            )
            .with_code("CONV-PARSE-002")
            .with_context("line", err.line().to_string())
        })?;
        Ok(Self::from_value(value))
    }

    /// Read and parse the collection file. A missing file is a parse error.
    pub async fn read(path: &Path) -> Result<Self, AppError> {
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            AppError::new(
                ErrorCategory::ParseError,
                format!("failed to read collection {}: {}", path.display(), err),
            )
            .with_code("CONV-PARSE-001")
            .with_context("path", path.display().to_string())
        })?;
        Self::from_slice(&bytes).map(|doc| {
            tracing::debug!(
                path = %path.display(),
                bytes = bytes.len(),
                enveloped = doc.is_enveloped(),
                "collection loaded"
            );
            doc
        })
    }

    pub fn is_enveloped(&self) -> bool {
        matches!(self, CollectionDocument::Enveloped(_))
    }

    /// The working value, with the envelope removed.
    pub fn into_inner(self) -> Value {
        match self {
            CollectionDocument::Raw(value) | CollectionDocument::Enveloped(value) => value,
        }
    }
}

/// Text handed to the converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedInput {
    pub text: String,
    pub was_enveloped: bool,
}

/// Unwrap the envelope and encode the working value the way converters expect:
/// string values pass through unchanged, anything else becomes compact JSON.
pub fn normalize(document: CollectionDocument) -> Result<NormalizedInput, AppError> {
    let was_enveloped = document.is_enveloped();
    let text = match document.into_inner() {
        Value::String(text) => text,
        other => serde_json::to_string(&other).map_err(|err| {
            AppError::new(
                ErrorCategory::ParseError,
                format!("failed to serialize collection: {}", err),
            )
            .with_code("CONV-PARSE-003")
        })?,
    };
    Ok(NormalizedInput {
        text,
        was_enveloped,
    })
}

/// Read, unwrap and encode the collection at `path`.
pub async fn load_normalized(path: &Path) -> Result<NormalizedInput, AppError> {
    normalize(CollectionDocument::read(path).await?)
}
