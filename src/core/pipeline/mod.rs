#![allow(clippy::result_large_err)]

use crate::core::collection;
use crate::core::config::loader::resolve_path;
use crate::core::config::DocsConfig;
use crate::core::converter::{ConversionOptions, Converter, PostmanConverter};
use crate::core::error::AppError;
use crate::core::fallback::{FallbackOutcome, SubprocessFallback};
use crate::core::ladder::{ConversionLadder, LadderOutcome};
use crate::core::types::{ConversionStage, ErrorCategory};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, Instrument};

/// Which stage produced the destination artifact, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// An in-process attempt returned the document and it was written.
    Converted { stage: ConversionStage },
    /// An in-process attempt wrote the document itself.
    ConverterWroteFile { stage: ConversionStage },
    SubprocessSucceeded,
    /// Every stage failed; `exit_code` is the subprocess exit code when one ran.
    Failed { exit_code: Option<i32> },
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, PipelineOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub outcome: PipelineOutcome,
    pub collection: PathBuf,
    pub destination: PathBuf,
    pub was_enveloped: bool,
    pub duration_ms: u64,
}

pub struct ConversionPipeline {
    ladder: ConversionLadder,
    options: ConversionOptions,
    fallback: Option<SubprocessFallback>,
}

impl ConversionPipeline {
    pub fn new(converter: Arc<dyn Converter>, options: ConversionOptions) -> Self {
        Self::with_ladder(ConversionLadder::for_converter(converter), options)
    }

    pub fn with_ladder(ladder: ConversionLadder, options: ConversionOptions) -> Self {
        Self {
            ladder,
            options,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: SubprocessFallback) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Native converter plus the configured fallback.
    pub fn from_config(config: &DocsConfig) -> Result<Self, AppError> {
        let pipeline = Self::new(
            Arc::new(PostmanConverter::new()),
            config.conversion.to_options(),
        );
        if !config.fallback.enabled {
            return Ok(pipeline);
        }
        let timeout = config.fallback.timeout().map_err(|err| {
            AppError::new(
                ErrorCategory::ConfigError,
                format!("invalid fallback.timeout '{}': {}", config.fallback.timeout, err),
            )
            .with_code("CFG-003")
        })?;
        Ok(pipeline.with_fallback(SubprocessFallback::new(
            config.fallback.command.clone(),
            timeout,
        )))
    }

    /// Run against the paths configured for `workspace`.
    pub async fn run_in_workspace(
        &self,
        config: &DocsConfig,
        workspace: &Path,
    ) -> Result<PipelineReport, AppError> {
        let collection = resolve_path(workspace, &config.paths.collection);
        let destination = resolve_path(workspace, &config.paths.output);
        self.run(&collection, &destination).await
    }

    /// Convert `collection` into `destination`.
    ///
    /// Only an unreadable or malformed collection is returned as an error;
    /// conversion failures are reported through [`PipelineOutcome::Failed`].
    pub async fn run(
        &self,
        collection_path: &Path,
        destination: &Path,
    ) -> Result<PipelineReport, AppError> {
        let span = tracing::info_span!(
            "convert",
            collection = %collection_path.display(),
            destination = %destination.display()
        );
        self.run_stages(collection_path, destination)
            .instrument(span)
            .await
    }

    async fn run_stages(
        &self,
        collection_path: &Path,
        destination: &Path,
    ) -> Result<PipelineReport, AppError> {
        let start = Instant::now();
        let input = collection::load_normalized(collection_path)
            .await
            .inspect_err(|err| error!(code = %err.code, "cannot read collection: {}", err.message))?;
        if input.was_enveloped {
            info!("collection envelope unwrapped");
        }

        let outcome = match self.ladder.run(&input.text, destination, &self.options).await {
            LadderOutcome::Written { stage } => PipelineOutcome::Converted { stage },
            LadderOutcome::SideEffect { stage } => PipelineOutcome::ConverterWroteFile { stage },
            LadderOutcome::Exhausted => match &self.fallback {
                Some(fallback) => match fallback.run(collection_path, destination).await {
                    FallbackOutcome::Succeeded { .. } => PipelineOutcome::SubprocessSucceeded,
                    FallbackOutcome::Failed { exit_code, .. } => {
                        PipelineOutcome::Failed { exit_code }
                    }
                },
                None => {
                    error!("conversion failed and the subprocess fallback is disabled");
                    PipelineOutcome::Failed { exit_code: None }
                }
            },
        };

        Ok(PipelineReport {
            outcome,
            collection: collection_path.to_path_buf(),
            destination: destination.to_path_buf(),
            was_enveloped: input.was_enveloped,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
