use apidocs::core::error::AppError;
use apidocs::core::fallback::{FallbackOutcome, SubprocessFallback};
use apidocs::tools::execution::{CommandOutcome, CommandRequest, CommandRunner};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Write an executable shell script that stands in for the external converter.
/// It receives `<source> -f <destination>` as `$1 $2 $3`.
fn fake_converter(dir: &TempDir, body: &str) -> String {
    let path = dir.path().join("converter.sh");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    format!("sh '{}'", path.display())
}

fn collection(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, r#"{"info":{"name":"Shop"},"item":[]}"#).unwrap();
    path
}

#[tokio::test]
async fn test_stdout_is_streamed_into_destination() {
    let dir = TempDir::new().unwrap();
    let source = collection(&dir, "collection.json");
    let destination = dir.path().join("openapi.yml");
    let command = fake_converter(&dir, "printf 'openapi: 3.0.0\\n'\nprintf 'source: %s\\n' \"$1\"");

    let outcome = SubprocessFallback::new(command, Some(Duration::from_secs(10)))
        .run(&source, &destination)
        .await;

    assert!(outcome.is_success());
    let written = fs::read_to_string(&destination).unwrap();
    assert!(written.starts_with("openapi: 3.0.0\n"));
    assert!(written.contains(&format!("source: {}", source.display())));
}

#[tokio::test]
async fn test_paths_with_spaces_reach_the_tool_intact() {
    let dir = TempDir::new().unwrap();
    let source = collection(&dir, "my collection.json");
    let destination = dir.path().join("out dir").join("open api.yml");
    let command = fake_converter(&dir, "cat \"$1\"\n[ \"$2\" = \"-f\" ] || exit 9");

    let outcome = SubprocessFallback::new(command, None)
        .run(&source, &destination)
        .await;

    assert!(outcome.is_success());
    assert_eq!(
        fs::read_to_string(&destination).unwrap(),
        r#"{"info":{"name":"Shop"},"item":[]}"#
    );
}

#[tokio::test]
async fn test_non_zero_exit_leaves_destination_unchanged() {
    let dir = TempDir::new().unwrap();
    let source = collection(&dir, "collection.json");
    let destination = dir.path().join("openapi.yml");
    fs::write(&destination, "previous document").unwrap();
    let command = fake_converter(&dir, "echo 'partial output'\necho 'boom' >&2\nexit 3");

    let outcome = SubprocessFallback::new(command, None)
        .run(&source, &destination)
        .await;

    match outcome {
        FallbackOutcome::Failed { exit_code, reason } => {
            assert_eq!(exit_code, Some(3));
            assert!(reason.contains("exited with code 3"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(
        fs::read_to_string(&destination).unwrap(),
        "previous document"
    );
}

#[tokio::test]
async fn test_non_zero_exit_without_destination_creates_nothing() {
    let dir = TempDir::new().unwrap();
    let source = collection(&dir, "collection.json");
    let destination = dir.path().join("openapi.yml");
    let command = fake_converter(&dir, "exit 1");

    let outcome = SubprocessFallback::new(command, None)
        .run(&source, &destination)
        .await;

    assert!(!outcome.is_success());
    assert!(!destination.exists());
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".partial"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_missing_command_is_reported_not_raised() {
    let dir = TempDir::new().unwrap();
    let source = collection(&dir, "collection.json");
    let destination = dir.path().join("openapi.yml");

    let outcome = SubprocessFallback::new("apidocs-no-such-converter-xyz", None)
        .run(&source, &destination)
        .await;

    match outcome {
        FallbackOutcome::Failed { exit_code, .. } => assert_eq!(exit_code, Some(127)),
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(!destination.exists());
}

#[tokio::test]
async fn test_tool_writing_destination_itself_is_kept() {
    let dir = TempDir::new().unwrap();
    let source = collection(&dir, "collection.json");
    let destination = dir.path().join("openapi.yml");
    let command = fake_converter(&dir, "printf 'written by tool' > \"$3\"");

    let outcome = SubprocessFallback::new(command, None)
        .run(&source, &destination)
        .await;

    assert_eq!(outcome, FallbackOutcome::Succeeded { stdout_bytes: 0 });
    assert_eq!(
        fs::read_to_string(&destination).unwrap(),
        "written by tool"
    );
}

#[tokio::test]
async fn test_timeout_kills_the_subprocess() {
    let dir = TempDir::new().unwrap();
    let source = collection(&dir, "collection.json");
    let destination = dir.path().join("openapi.yml");
    let command = fake_converter(&dir, "exec sleep 30");

    let start = Instant::now();
    let outcome = SubprocessFallback::new(command, Some(Duration::from_millis(300)))
        .run(&source, &destination)
        .await;

    assert!(start.elapsed() < Duration::from_secs(10));
    match outcome {
        FallbackOutcome::Failed { exit_code, reason } => {
            assert_eq!(exit_code, None);
            assert!(reason.contains("timed out"));
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(!destination.exists());
}

#[tokio::test]
async fn test_timeout_stops_tool_from_writing_late() {
    let dir = TempDir::new().unwrap();
    let source = collection(&dir, "collection.json");
    let destination = dir.path().join("openapi.yml");
    fs::write(&destination, "previous").unwrap();
    let command = fake_converter(&dir, "sleep 1\nprintf 'late write' > \"$3\"");

    let outcome = SubprocessFallback::new(command, Some(Duration::from_millis(300)))
        .run(&source, &destination)
        .await;

    assert!(matches!(outcome, FallbackOutcome::Failed { exit_code: None, .. }));
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(fs::read_to_string(&destination).unwrap(), "previous");
}

/// Records the request and writes a canned document into the sink.
struct RecordingRunner {
    requests: Mutex<Vec<CommandRequest>>,
    output: &'static str,
    exit_code: i32,
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(
        &self,
        request: &CommandRequest,
        mut stdout_sink: File,
    ) -> Result<CommandOutcome, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        stdout_sink.write_all(self.output.as_bytes()).await.unwrap();
        stdout_sink.shutdown().await.unwrap();
        Ok(CommandOutcome {
            exit_code: Some(self.exit_code),
            stdout_bytes: self.output.len() as u64,
            duration_ms: 1,
            timed_out: false,
        })
    }
}

#[tokio::test]
async fn test_invocation_shape() {
    let dir = TempDir::new().unwrap();
    let source = collection(&dir, "collection.json");
    let destination = dir.path().join("openapi.yml");
    let runner = Arc::new(RecordingRunner {
        requests: Mutex::new(Vec::new()),
        output: "openapi: 3.0.0\n",
        exit_code: 0,
    });

    let fallback = SubprocessFallback::with_runner("p2o", None, runner.clone());
    let outcome = fallback.run(&source, &destination).await;

    assert_eq!(outcome, FallbackOutcome::Succeeded { stdout_bytes: 15 });
    let requests = runner.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].script, "p2o \"$1\" -f \"$2\"");
    assert_eq!(
        requests[0].args,
        vec![
            source.as_os_str().to_os_string(),
            destination.as_os_str().to_os_string()
        ]
    );
    assert_eq!(fs::read_to_string(&destination).unwrap(), "openapi: 3.0.0\n");
}

#[tokio::test]
async fn test_runner_failure_keeps_previous_document() {
    let dir = TempDir::new().unwrap();
    let source = collection(&dir, "collection.json");
    let destination: &Path = &dir.path().join("openapi.yml");
    fs::write(destination, "previous").unwrap();
    let runner = Arc::new(RecordingRunner {
        requests: Mutex::new(Vec::new()),
        output: "half a docu",
        exit_code: 2,
    });

    let outcome = SubprocessFallback::with_runner("p2o", None, runner)
        .run(&source, destination)
        .await;

    assert!(matches!(
        outcome,
        FallbackOutcome::Failed {
            exit_code: Some(2),
            ..
        }
    ));
    assert_eq!(fs::read_to_string(destination).unwrap(), "previous");
}
