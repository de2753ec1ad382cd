use apidocs::core::converter::{ConversionOptions, Converter};
use apidocs::core::error::AppError;
use apidocs::core::ladder::{ConversionLadder, LadderOutcome};
use apidocs::core::{ConversionStage, ErrorCategory};
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// What a stub call shape does when invoked.
#[derive(Clone)]
enum Behavior {
    Fail,
    Return(&'static str),
    WriteFile(&'static str),
    Nothing,
}

struct StubConverter {
    with_destination: Behavior,
    input_only: Behavior,
    with_destination_calls: AtomicUsize,
    input_only_calls: AtomicUsize,
}

impl StubConverter {
    fn new(with_destination: Behavior, input_only: Behavior) -> Arc<Self> {
        Arc::new(Self {
            with_destination,
            input_only,
            with_destination_calls: AtomicUsize::new(0),
            input_only_calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> (usize, usize) {
        (
            self.with_destination_calls.load(Ordering::SeqCst),
            self.input_only_calls.load(Ordering::SeqCst),
        )
    }
}

fn act(behavior: &Behavior, destination: Option<&Path>) -> Result<Option<String>, AppError> {
    match behavior {
        Behavior::Fail => Err(AppError::new(
            ErrorCategory::ConversionAttemptError,
            "unsupported call shape",
        )),
        Behavior::Return(text) => Ok(Some(text.to_string())),
        Behavior::WriteFile(text) => {
            if let Some(path) = destination {
                fs::write(path, text).unwrap();
            }
            Ok(None)
        }
        Behavior::Nothing => Ok(None),
    }
}

#[async_trait]
impl Converter for StubConverter {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn convert_to_file(
        &self,
        _input: &str,
        destination: &Path,
        _options: &ConversionOptions,
    ) -> Result<Option<String>, AppError> {
        self.with_destination_calls.fetch_add(1, Ordering::SeqCst);
        act(&self.with_destination, Some(destination))
    }

    async fn convert(
        &self,
        _input: &str,
        _options: &ConversionOptions,
    ) -> Result<Option<String>, AppError> {
        self.input_only_calls.fetch_add(1, Ordering::SeqCst);
        act(&self.input_only, None)
    }
}

async fn run_ladder(converter: Arc<StubConverter>, destination: &Path) -> LadderOutcome {
    let ladder = ConversionLadder::for_converter(converter);
    ladder
        .run("{}", destination, &ConversionOptions::default())
        .await
}

#[test]
fn test_stage_order() {
    let ladder = ConversionLadder::for_converter(StubConverter::new(
        Behavior::Nothing,
        Behavior::Nothing,
    ));
    assert_eq!(
        ladder.stages(),
        vec![ConversionStage::WithDestination, ConversionStage::InputOnly]
    );
}

#[tokio::test]
async fn test_first_attempt_payload_is_written() {
    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("openapi.yml");
    let converter = StubConverter::new(Behavior::Return("openapi: 3.0.0\n"), Behavior::Fail);

    let outcome = run_ladder(converter.clone(), &destination).await;

    assert_eq!(
        outcome,
        LadderOutcome::Written {
            stage: ConversionStage::WithDestination
        }
    );
    assert_eq!(fs::read_to_string(&destination).unwrap(), "openapi: 3.0.0\n");
    assert_eq!(converter.calls(), (1, 0));
}

#[tokio::test]
async fn test_first_attempt_failure_falls_through_to_second() {
    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("openapi.yml");
    let converter = StubConverter::new(Behavior::Fail, Behavior::Return("openapi: 3.0.3\n"));

    let outcome = run_ladder(converter.clone(), &destination).await;

    assert_eq!(
        outcome,
        LadderOutcome::Written {
            stage: ConversionStage::InputOnly
        }
    );
    assert_eq!(fs::read_to_string(&destination).unwrap(), "openapi: 3.0.3\n");
    assert_eq!(converter.calls(), (1, 1));
}

#[tokio::test]
async fn test_side_effect_is_success_without_rewrite() {
    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("openapi.yml");
    let converter = StubConverter::new(Behavior::WriteFile("written by converter"), Behavior::Fail);

    let outcome = run_ladder(converter.clone(), &destination).await;

    assert_eq!(
        outcome,
        LadderOutcome::SideEffect {
            stage: ConversionStage::WithDestination
        }
    );
    assert_eq!(
        fs::read_to_string(&destination).unwrap(),
        "written by converter"
    );
    assert_eq!(converter.calls(), (1, 0));
}

#[tokio::test]
async fn test_unusable_result_skips_second_attempt() {
    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("openapi.yml");
    let converter = StubConverter::new(Behavior::Nothing, Behavior::Return("unused"));

    let outcome = run_ladder(converter.clone(), &destination).await;

    assert_eq!(outcome, LadderOutcome::Exhausted);
    assert!(!destination.exists());
    assert_eq!(converter.calls(), (1, 0));
}

#[tokio::test]
async fn test_both_attempts_failing_exhausts_ladder() {
    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("openapi.yml");
    let converter = StubConverter::new(Behavior::Fail, Behavior::Fail);

    let outcome = run_ladder(converter.clone(), &destination).await;

    assert_eq!(outcome, LadderOutcome::Exhausted);
    assert!(!outcome.is_success());
    assert!(!destination.exists());
    assert_eq!(converter.calls(), (1, 1));
}

#[tokio::test]
async fn test_stale_destination_counts_as_side_effect() {
    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("openapi.yml");
    fs::write(&destination, "stale").unwrap();
    let converter = StubConverter::new(Behavior::Nothing, Behavior::Fail);

    let outcome = run_ladder(converter, &destination).await;

    assert!(outcome.is_success());
    assert_eq!(fs::read_to_string(&destination).unwrap(), "stale");
}

#[tokio::test]
async fn test_payload_overwrites_existing_destination() {
    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("nested").join("openapi.yml");
    fs::create_dir_all(destination.parent().unwrap()).unwrap();
    fs::write(&destination, "old").unwrap();
    let converter = StubConverter::new(Behavior::Fail, Behavior::Return("new"));

    run_ladder(converter, &destination).await;

    assert_eq!(fs::read_to_string(&destination).unwrap(), "new");
}
