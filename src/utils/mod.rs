//! Utility helpers: artifact file writes.
pub mod files;

pub use files::{artifact_exists, write_artifact};
