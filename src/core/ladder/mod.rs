//! Conversion Attempt Ladder.
//!
//! An ordered list of in-process strategies. The first strategy that returns
//! without error decides the outcome; later strategies only run after an
//! earlier one failed. The ladder never returns an error: exhaustion is an
//! outcome the pipeline reacts to by starting the subprocess fallback.

#![allow(clippy::result_large_err)]

use crate::core::converter::{ConversionOptions, Converter};
use crate::core::error::AppError;
use crate::core::types::{ConversionStage, ErrorCategory};
use crate::utils::files::{artifact_exists, write_artifact};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// What a successful attempt left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionResult {
    /// The converter returned the document text.
    Payload(String),
    /// Nothing returned, but the destination exists on disk.
    SideEffect,
    /// Nothing returned and no destination file.
    Unusable,
}

impl ConversionResult {
    /// Classify a converter's return value against the destination on disk.
    pub async fn classify(output: Option<String>, destination: &Path) -> Self {
        match output {
            Some(text) => ConversionResult::Payload(text),
            None if artifact_exists(destination).await => ConversionResult::SideEffect,
            None => ConversionResult::Unusable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderOutcome {
    /// The returned text was written to the destination.
    Written { stage: ConversionStage },
    /// The converter wrote the destination itself.
    SideEffect { stage: ConversionStage },
    /// No strategy produced a usable artifact.
    Exhausted,
}

impl LadderOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, LadderOutcome::Exhausted)
    }
}

#[async_trait]
pub trait ConversionStrategy: Send + Sync {
    fn stage(&self) -> ConversionStage;

    async fn attempt(
        &self,
        input: &str,
        destination: &Path,
        options: &ConversionOptions,
    ) -> Result<Option<String>, AppError>;
}

/// Calls `convert_to_file(input, destination, options)`.
pub struct WithDestinationStrategy {
    converter: Arc<dyn Converter>,
}

impl WithDestinationStrategy {
    pub fn new(converter: Arc<dyn Converter>) -> Self {
        Self { converter }
    }
}

#[async_trait]
impl ConversionStrategy for WithDestinationStrategy {
    fn stage(&self) -> ConversionStage {
        ConversionStage::WithDestination
    }

    async fn attempt(
        &self,
        input: &str,
        destination: &Path,
        options: &ConversionOptions,
    ) -> Result<Option<String>, AppError> {
        self.converter
            .convert_to_file(input, destination, options)
            .await
            .map_err(|err| attempt_error(self.converter.name(), self.stage(), err))
    }
}

/// Calls `convert(input, options)`; the destination is left to the ladder.
pub struct InputOnlyStrategy {
    converter: Arc<dyn Converter>,
}

impl InputOnlyStrategy {
    pub fn new(converter: Arc<dyn Converter>) -> Self {
        Self { converter }
    }
}

#[async_trait]
impl ConversionStrategy for InputOnlyStrategy {
    fn stage(&self) -> ConversionStage {
        ConversionStage::InputOnly
    }

    async fn attempt(
        &self,
        input: &str,
        _destination: &Path,
        options: &ConversionOptions,
    ) -> Result<Option<String>, AppError> {
        self.converter
            .convert(input, options)
            .await
            .map_err(|err| attempt_error(self.converter.name(), self.stage(), err))
    }
}

fn attempt_error(converter: &str, stage: ConversionStage, source: AppError) -> AppError {
    let code = match stage {
        ConversionStage::WithDestination => "CONV-ATTEMPT-001",
        ConversionStage::InputOnly => "CONV-ATTEMPT-002",
    };
    AppError::new(
        ErrorCategory::ConversionAttemptError,
        format!("{} converter failed: {}", converter, source.message),
    )
    .with_code(code)
    .with_context("stage", stage.marker())
    .with_context("cause_code", source.code)
}

pub struct ConversionLadder {
    strategies: Vec<Box<dyn ConversionStrategy>>,
}

impl ConversionLadder {
    pub fn new(strategies: Vec<Box<dyn ConversionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Both call shapes of `converter`, destination-taking shape first.
    pub fn for_converter(converter: Arc<dyn Converter>) -> Self {
        Self::new(vec![
            Box::new(WithDestinationStrategy::new(converter.clone())),
            Box::new(InputOnlyStrategy::new(converter)),
        ])
    }

    pub fn stages(&self) -> Vec<ConversionStage> {
        self.strategies.iter().map(|s| s.stage()).collect()
    }

    pub async fn run(
        &self,
        input: &str,
        destination: &Path,
        options: &ConversionOptions,
    ) -> LadderOutcome {
        for strategy in &self.strategies {
            let stage = strategy.stage();
            let output = match strategy.attempt(input, destination, options).await {
                Ok(output) => output,
                Err(err) => {
                    warn!(stage = %stage, code = %err.code, "conversion attempt failed: {}", err.message);
                    continue;
                }
            };

            return match ConversionResult::classify(output, destination).await {
                ConversionResult::Payload(text) => {
                    match write_artifact(destination, text.as_bytes()).await {
                        Ok(()) => {
                            info!(
                                stage = %stage,
                                destination = %destination.display(),
                                bytes = text.len(),
                                "conversion succeeded, document written"
                            );
                            LadderOutcome::Written { stage }
                        }
                        Err(err) => {
                            warn!(stage = %stage, code = %err.code, "failed to write converted document: {}", err.message);
                            LadderOutcome::Exhausted
                        }
                    }
                }
                ConversionResult::SideEffect => {
                    info!(
                        stage = %stage,
                        destination = %destination.display(),
                        "conversion succeeded, converter wrote the document"
                    );
                    LadderOutcome::SideEffect { stage }
                }
                ConversionResult::Unusable => {
                    warn!(stage = %stage, "converter returned no output and wrote no document");
                    LadderOutcome::Exhausted
                }
            };
        }

        warn!("all in-process conversion attempts failed");
        LadderOutcome::Exhausted
    }
}
