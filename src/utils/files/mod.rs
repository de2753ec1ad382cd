#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use std::path::Path;

/// Write `content` to `path`, creating parent directories and replacing any
/// existing file.
pub async fn write_artifact(path: &Path, content: &[u8]) -> Result<(), AppError> {
    ensure_parent_dir(path).await?;
    tokio::fs::write(path, content).await.map_err(|e| {
        AppError::new(
            ErrorCategory::IoError,
            format!("Failed to write artifact {}: {}", path.display(), e),
        )
        .with_code("CONV-WRITE-001")
    })
}

/// Create the parent directory of `path` when it has one.
pub async fn ensure_parent_dir(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to create directory {}: {}", parent.display(), e),
            )
            .with_code("CONV-WRITE-001")
        })?;
    }
    Ok(())
}

/// `true` when `path` names an existing regular file.
pub async fn artifact_exists(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}
