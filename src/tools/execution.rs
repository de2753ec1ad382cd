#![allow(clippy::result_large_err)] // Runner returns AppError to surface spawn diagnostics without boxing.

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Name given to `$0` of the `sh -c` script.
const SHELL_ARG0: &str = "apidocs";

/// A shell script run as `sh -c <script> apidocs <args...>`.
///
/// Positional `args` are available to the script as `"$1"`, `"$2"`, ... so
/// paths reach the tool unmodified while the script itself still gets shell
/// resolution (PATH lookup, aliases in wrapper scripts, `npx p2o`, ...).
#[derive(Clone, Debug)]
pub struct CommandRequest {
    pub script: String,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOutcome {
    /// `None` when the process was killed by a signal or timed out.
    pub exit_code: Option<i32>,
    pub stdout_bytes: u64,
    pub duration_ms: u64,
    pub timed_out: bool,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync + 'static {
    /// Run the request, streaming stdout into `stdout_sink` and forwarding
    /// stderr to this process's stderr. The sink is flushed and closed before
    /// returning.
    async fn run(
        &self,
        request: &CommandRequest,
        stdout_sink: File,
    ) -> Result<CommandOutcome, AppError>;
}

pub struct ShellCommandRunner;

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(
        &self,
        request: &CommandRequest,
        mut stdout_sink: File,
    ) -> Result<CommandOutcome, AppError> {
        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(&request.script)
            .arg(SHELL_ARG0)
            .args(&request.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        // own process group, so a timeout also reaches tools the script forks
        #[cfg(unix)]
        command.process_group(0);
        if let Some(cwd) = &request.cwd {
            command.current_dir(cwd);
        }

        tracing::debug!(script = %request.script, args = ?request.args, "spawning command");

        let start = Instant::now();
        let mut child = command.spawn().map_err(|err| {
            AppError::new(
                ErrorCategory::SubprocessError,
                format!("failed to spawn `{}`: {}", request.script, err),
            )
            .with_code("CONV-SUBPROC-002")
        })?;
        let pid = child.id();

        let mut stdout = child.stdout.take().ok_or_else(|| {
            AppError::new(ErrorCategory::SubprocessError, "child stdout was not piped")
                .with_code("CONV-SUBPROC-002")
        })?;

        let stream = async {
            let copied = tokio::io::copy(&mut stdout, &mut stdout_sink).await?;
            stdout_sink.shutdown().await?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((copied, status))
        };

        let waited = match request.timeout {
            Some(limit) => tokio::time::timeout(limit, stream).await.ok(),
            None => Some(stream.await),
        };

        let Some(result) = waited else {
            if let Some(pid) = pid {
                kill_process_group(pid);
            }
            let _ = child.kill().await;
            return Ok(CommandOutcome {
                exit_code: None,
                stdout_bytes: 0,
                duration_ms: start.elapsed().as_millis() as u64,
                timed_out: true,
            });
        };

        let (stdout_bytes, status) = result.map_err(|err| {
            AppError::new(
                ErrorCategory::SubprocessError,
                format!("failed to stream command output: {}", err),
            )
            .with_code("CONV-SUBPROC-003")
        })?;

        Ok(CommandOutcome {
            exit_code: status.code(),
            stdout_bytes,
            duration_ms: start.elapsed().as_millis() as u64,
            timed_out: false,
        })
    }
}

/// SIGKILL every process in the group led by `pid`.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Err(err) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        tracing::debug!(pid, error = %err, "failed to signal process group");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}
