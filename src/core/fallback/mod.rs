//! Subprocess Fallback.
//!
//! Last stage of the pipeline: runs an external CLI converter as
//! `<command> <source> -f <destination>` and streams its stdout into the
//! destination. Failures are logged and reported as an outcome, never raised.

#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::tools::execution::{CommandRequest, CommandRunner, ShellCommandRunner};
use crate::utils::files::{artifact_exists, ensure_parent_dir};
use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackOutcome {
    Succeeded { stdout_bytes: u64 },
    Failed { exit_code: Option<i32>, reason: String },
}

impl FallbackOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FallbackOutcome::Succeeded { .. })
    }
}

pub struct SubprocessFallback {
    command: String,
    timeout: Option<Duration>,
    runner: Arc<dyn CommandRunner>,
}

impl SubprocessFallback {
    pub fn new(command: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self::with_runner(command, timeout, Arc::new(ShellCommandRunner))
    }

    pub fn with_runner(
        command: impl Into<String>,
        timeout: Option<Duration>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            command: command.into(),
            timeout,
            runner,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Script handed to `sh -c`; the paths arrive as `$1` and `$2`.
    pub fn script(&self) -> String {
        format!("{} \"$1\" -f \"$2\"", self.command)
    }

    pub async fn run(&self, source: &Path, destination: &Path) -> FallbackOutcome {
        info!(
            command = %self.command,
            source = %source.display(),
            destination = %destination.display(),
            "starting subprocess fallback"
        );
        match self.try_run(source, destination).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    code = %err.code,
                    category = %err.category,
                    command = %self.command,
                    "subprocess fallback failed: {}",
                    err.message
                );
                FallbackOutcome::Failed {
                    exit_code: None,
                    reason: err.message,
                }
            }
        }
    }

    async fn try_run(&self, source: &Path, destination: &Path) -> Result<FallbackOutcome, AppError> {
        ensure_parent_dir(destination).await?;
        let staging_dir = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        // stdout lands next to the destination and only replaces it on success
        let staging = tempfile::Builder::new()
            .prefix(".apidocs-")
            .suffix(".partial")
            .tempfile_in(staging_dir)
            .map_err(|err| subprocess_error("CONV-SUBPROC-003", "failed to open output stream", err))?;
        let sink = staging
            .reopen()
            .map_err(|err| subprocess_error("CONV-SUBPROC-003", "failed to open output stream", err))?;

        let modified_before = modified_time(destination).await;
        let request = CommandRequest {
            script: self.script(),
            args: vec![
                OsString::from(source.as_os_str()),
                OsString::from(destination.as_os_str()),
            ],
            cwd: None,
            timeout: self.timeout,
        };
        let outcome = self
            .runner
            .run(&request, tokio::fs::File::from_std(sink))
            .await?;

        if outcome.timed_out {
            let limit = humantime::format_duration(self.timeout.unwrap_or_default());
            return Err(AppError::new(
                ErrorCategory::TimeoutError,
                format!("timed out after {}", limit),
            )
            .with_code("CONV-SUBPROC-004")
            .with_context("command", self.command.clone())
            .with_context("duration_ms", outcome.duration_ms.to_string()));
        }

        if outcome.exit_code != Some(0) {
            let code = outcome
                .exit_code
                .map(|code| code.to_string())
                .unwrap_or_else(|| "none (terminated by signal)".to_string());
            error!(
                code = "CONV-SUBPROC-001",
                command = %self.command,
                "conversion failed: subprocess exited with code {}",
                code
            );
            return Ok(FallbackOutcome::Failed {
                exit_code: outcome.exit_code,
                reason: format!("subprocess exited with code {}", code),
            });
        }

        let tool_wrote_destination = artifact_exists(destination).await
            && modified_time(destination).await != modified_before;
        if outcome.stdout_bytes == 0 && tool_wrote_destination {
            info!(
                destination = %destination.display(),
                "subprocess wrote the document itself"
            );
        } else {
            staging.persist(destination).map_err(|err| {
                subprocess_error("CONV-SUBPROC-003", "failed to move output into place", err.error)
            })?;
        }

        if !artifact_exists(destination).await {
            error!(
                code = "CONV-SUBPROC-001",
                "conversion failed: subprocess exited with code 0 but {} is missing",
                destination.display()
            );
            return Ok(FallbackOutcome::Failed {
                exit_code: Some(0),
                reason: "destination missing after subprocess exit".to_string(),
            });
        }

        if outcome.stdout_bytes == 0 && !tool_wrote_destination {
            warn!(destination = %destination.display(), "subprocess produced an empty document");
        }
        info!(
            destination = %destination.display(),
            bytes = outcome.stdout_bytes,
            duration_ms = outcome.duration_ms,
            "subprocess fallback succeeded"
        );
        Ok(FallbackOutcome::Succeeded {
            stdout_bytes: outcome.stdout_bytes,
        })
    }
}

async fn modified_time(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path)
        .await
        .ok()
        .and_then(|meta| meta.modified().ok())
}

fn subprocess_error(code: &str, message: &str, err: std::io::Error) -> AppError {
    AppError::new(
        ErrorCategory::SubprocessError,
        format!("{}: {}", message, err),
    )
    .with_code(code)
}
